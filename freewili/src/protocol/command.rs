//! Line-oriented command frames.
//!
//! Every command is a one-letter tag followed by its arguments, each on its
//! own line:
//!
//! ```text
//! h\n3\n                 set IO 3 high
//! o\n3 1000 50\n         PWM on IO 3, 1 kHz, 50 %
//! s\n0A FF\n             SPI transceive two bytes
//! x\nf\nTEST.TXT 10 525\n  begin download
//! ```

use std::fmt;

use crate::protocol::LineEnding;
use crate::protocol::hex;

/// Control byte that turns the interactive menu off (Ctrl+B).
pub const DISABLE_MENU: u8 = 0x02;

/// Control byte that turns the interactive menu on (Ctrl+C).
pub const ENABLE_MENU: u8 = 0x03;

/// Output level of an IO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoLevel {
    /// Drive high.
    High,
    /// Drive low.
    Low,
}

impl From<bool> for IoLevel {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

impl fmt::Display for IoLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Binary passthrough bus, identified on the wire by a one-letter tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Passthrough {
    /// SPI transceive (`s`).
    Spi,
    /// I2C transceive (`i`).
    I2c,
    /// Radio write (`t`).
    RadioWrite,
    /// Radio read (`k`).
    RadioRead,
    /// UART write/read (`u`).
    Uart,
}

impl Passthrough {
    /// Wire tag of this bus.
    pub fn tag(self) -> char {
        match self {
            Self::Spi => 's',
            Self::I2c => 'i',
            Self::RadioWrite => 't',
            Self::RadioRead => 'k',
            Self::Uart => 'u',
        }
    }
}

/// A single command frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    /// Enable or disable the interactive menu.
    Menu {
        /// `true` to enable.
        enabled: bool,
    },
    /// Set an IO pin.
    SetIo {
        /// Pin number.
        pin: u32,
        /// Level to drive.
        level: IoLevel,
    },
    /// Start PWM on a pin.
    Pwm {
        /// Pin number.
        pin: u32,
        /// Frequency in Hz.
        freq: u32,
        /// Duty cycle, 0-100.
        duty: u32,
    },
    /// Read the IO bitmap.
    GetAllIo,
    /// One passthrough segment.
    Segment {
        /// Target bus.
        bus: Passthrough,
        /// Segment payload.
        data: &'a [u8],
    },
    /// Scan the I2C bus.
    PollI2c,
    /// Run a script stored on the device.
    RunScript {
        /// File name on the device.
        name: &'a str,
    },
    /// Load an FPGA bitstream stored on the device.
    LoadBitstream {
        /// File name on the device.
        name: &'a str,
    },
    /// Begin a host to device transfer.
    SendFile {
        /// Target name on the device.
        name: &'a str,
        /// Payload size in bytes.
        size: usize,
        /// Rolling checksum, when the device verifies downloads.
        checksum: Option<u32>,
    },
    /// Begin a device to host transfer.
    GetFile {
        /// File name on the device.
        name: &'a str,
    },
}

impl Command<'_> {
    /// Render the frame with the given line terminator.
    ///
    /// Menu control frames always end in `\r\n`, whatever `eol` is.
    pub fn encode(&self, eol: LineEnding) -> Vec<u8> {
        let nl = eol.as_str();
        let text = match self {
            Self::Menu { enabled } => {
                let ctrl = if *enabled { ENABLE_MENU } else { DISABLE_MENU };
                let mut frame = vec![ctrl];
                frame.extend_from_slice(LineEnding::CrLf.as_str().as_bytes());
                return frame;
            },
            Self::SetIo { pin, level } => {
                let letter = match level {
                    IoLevel::High => 'h',
                    IoLevel::Low => 'l',
                };
                format!("{letter}{nl}{pin}{nl}")
            },
            Self::Pwm { pin, freq, duty } => format!("o{nl}{pin} {freq} {duty}{nl}"),
            Self::GetAllIo => format!("g{nl}"),
            Self::Segment { bus, data } => {
                format!("{}{nl}{}{nl}", bus.tag(), hex::encode(data))
            },
            Self::PollI2c => format!("p{nl}"),
            Self::RunScript { name } => format!("w{nl}{name}{nl}"),
            Self::LoadBitstream { name } => format!("m{nl}{name}{nl}"),
            Self::SendFile {
                name,
                size,
                checksum: Some(sum),
            } => format!("x{nl}f{nl}{name} {size} {sum}{nl}"),
            Self::SendFile {
                name,
                size,
                checksum: None,
            } => format!("x{nl}f{nl}{name} {size}{nl}"),
            Self::GetFile { name } => format!("x{nl}u{nl}{name}{nl}"),
        };
        text.into_bytes()
    }
}
