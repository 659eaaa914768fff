//! 24-bit rolling checksum used to validate file downloads.
//!
//! For every byte: add it to the accumulator, XOR-fold with `2054` when bit 15
//! is set, then mask to 24 bits. This is not a CRC; the device computes the
//! same sum over the bytes it receives and compares it with the header.

/// XOR constant applied when bit 15 of the accumulator is set.
pub const FOLD: u32 = 2054;

const FOLD_BIT: u32 = 0x8000;
const MASK: u32 = 0x00FF_FFFF;

/// Incremental rolling checksum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollingChecksum {
    acc: u32,
}

impl RollingChecksum {
    /// Start a fresh accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a single byte.
    pub fn push(&mut self, byte: u8) {
        let mut acc = self.acc + u32::from(byte);
        if acc & FOLD_BIT != 0 {
            acc ^= FOLD;
        }
        self.acc = acc & MASK;
    }

    /// Feed a run of bytes.
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.push(byte);
        }
    }

    /// Current value, always below `2^24`.
    pub fn value(&self) -> u32 {
        self.acc
    }
}

/// Checksum of a whole buffer.
pub fn checksum(data: &[u8]) -> u32 {
    let mut sum = RollingChecksum::new();
    sum.update(data);
    sum.value()
}
