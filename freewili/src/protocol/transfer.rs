//! File transfer requests.
//!
//! ## Download (host → device)
//!
//! ```text
//! host                          device
//!  | x\nf\n<name> <size> <sum>\n  |
//!  |----------------------------->|   arms its receive buffer
//!  |        (settle delay)        |
//!  | payload, chunk by chunk      |
//!  |----------------------------->|   accumulates the same checksum
//!  |      (completion delay)      |
//!  |<-----------------------------|   status text
//! ```
//!
//! ## Upload (device → host)
//!
//! ```text
//!  | x\nu\n<name>\n               |
//!  |----------------------------->|
//!  |        (upload delay)        |
//!  |<-----------------------------|   file bytes, no length prefix
//! ```

use log::warn;

use crate::error::{Error, Result};
use crate::protocol::checksum::RollingChecksum;
use crate::protocol::command::Command;

/// One host to device transfer, built per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTransferRequest {
    name: String,
    size: usize,
    checksum: RollingChecksum,
}

impl FileTransferRequest {
    /// Prepare a transfer of `data` to `target_name` on the device.
    pub fn new(target_name: &str, data: &[u8]) -> Result<Self> {
        validate_target_name(target_name)?;
        let mut checksum = RollingChecksum::new();
        checksum.update(data);
        Ok(Self {
            name: target_name.to_string(),
            size: data.len(),
            checksum,
        })
    }

    /// Target name on the device.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Rolling checksum over the whole payload.
    pub fn checksum(&self) -> u32 {
        self.checksum.value()
    }

    /// Header frame; the checksum field is present only when the device
    /// verifies downloads.
    pub fn header(&self, with_checksum: bool) -> Command<'_> {
        Command::SendFile {
            name: &self.name,
            size: self.size,
            checksum: with_checksum.then(|| self.checksum()),
        }
    }
}

/// Outcome of a completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TransferReport {
    /// Target name on the device.
    pub target: String,
    /// Bytes streamed.
    pub size: usize,
    /// Checksum announced in the header (or that would have been).
    pub checksum: u32,
    /// Whatever the device printed after the payload.
    pub device_reply: String,
}

/// Reject names that would break the header line, warn on non-8.3 names.
pub fn validate_target_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidArgument("target name is empty".into()));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(Error::InvalidArgument(format!(
            "target name '{}' contains whitespace",
            name.escape_debug()
        )));
    }
    if !is_short_name(name) {
        warn!("Target name '{name}' exceeds the 8.3 limit of older firmware");
    }
    Ok(())
}

/// Whether the last path component fits the legacy 8.3 scheme.
pub fn is_short_name(name: &str) -> bool {
    let file = name.rsplit('/').next().unwrap_or(name);
    let (stem, ext) = match file.rsplit_once('.') {
        Some((stem, ext)) => (stem, ext),
        None => (file, ""),
    };
    !stem.is_empty() && stem.len() <= 8 && ext.len() <= 3 && !stem.contains('.')
}
