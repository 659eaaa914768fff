//! FreeWili serial protocol.
//!
//! - [`command`]: line-oriented command frames
//! - [`hex`]: ASCII hex framing of passthrough payloads
//! - [`checksum`]: 24-bit rolling download checksum
//! - [`transfer`]: file transfer requests and reports
//! - [`scan`]: I2C bus-scan reply parser

pub mod checksum;
pub mod command;
pub mod hex;
pub mod scan;
pub mod transfer;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

pub use checksum::{RollingChecksum, checksum};
pub use command::{Command, IoLevel, Passthrough};
pub use scan::{I2cScan, ScanState};
pub use transfer::{FileTransferRequest, TransferReport};

/// Line terminator appended to every command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// Terminator text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lf => write!(f, "lf"),
            Self::CrLf => write!(f, "crlf"),
        }
    }
}

impl FromStr for LineEnding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lf" | "\n" => Ok(Self::Lf),
            "crlf" | "\r\n" => Ok(Self::CrLf),
            other => Err(Error::InvalidArgument(format!(
                "unknown line ending '{other}', expected 'lf' or 'crlf'"
            ))),
        }
    }
}

/// How `poll_i2c` turns scan rows into addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum I2cScanPolicy {
    /// Row base plus the column of every nonzero cell.
    #[default]
    BaseOffset,
    /// The nonzero cell values themselves (older firmware).
    LiteralValue,
}

/// Protocol features that differ between firmware revisions.
///
/// These are set explicitly by the caller; nothing is inferred from the
/// banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Capabilities {
    /// The download header carries the rolling checksum.
    pub download_checksum: bool,
    /// Interpretation of I2C scan rows.
    pub i2c_scan: I2cScanPolicy,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            download_checksum: true,
            i2c_scan: I2cScanPolicy::BaseOffset,
        }
    }
}

/// Framing and timing knobs of the protocol engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProtocolOptions {
    /// Line terminator for command lines.
    pub line_ending: LineEnding,
    /// Payload bytes per passthrough exchange.
    pub segment_size: usize,
    /// Payload bytes per write while streaming a download.
    pub transfer_chunk_size: usize,
    /// Pause between the download header and the first payload byte.
    pub settle_delay: Duration,
    /// Pause after the last payload byte before collecting the device reply.
    pub completion_delay: Duration,
    /// Pause between the upload header and draining the file content.
    pub upload_delay: Duration,
    /// Longest wait for the first banner byte.
    pub banner_timeout: Duration,
    /// Extra wait after the first banner byte so the rest can arrive.
    pub banner_settle: Duration,
    /// How long the port stays open at the bootloader baud rate.
    pub bootloader_hold: Duration,
}

impl Default for ProtocolOptions {
    fn default() -> Self {
        Self {
            line_ending: LineEnding::Lf,
            segment_size: hex::DEFAULT_SEGMENT_SIZE,
            transfer_chunk_size: 1,
            settle_delay: Duration::from_millis(100),
            completion_delay: Duration::from_secs(1),
            upload_delay: Duration::from_secs(1),
            banner_timeout: Duration::from_secs(3),
            banner_settle: Duration::from_millis(100),
            bootloader_hold: Duration::from_millis(100),
        }
    }
}

impl ProtocolOptions {
    /// Set the line terminator.
    #[must_use]
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Set the passthrough segment size.
    #[must_use]
    pub fn with_segment_size(mut self, segment_size: usize) -> Self {
        self.segment_size = segment_size;
        self
    }

    /// Set the download chunk size.
    #[must_use]
    pub fn with_transfer_chunk_size(mut self, chunk_size: usize) -> Self {
        self.transfer_chunk_size = chunk_size;
        self
    }

    /// Options with every delay set to zero, for scripted ports.
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.settle_delay = Duration::ZERO;
        self.completion_delay = Duration::ZERO;
        self.upload_delay = Duration::ZERO;
        self.banner_timeout = Duration::ZERO;
        self.banner_settle = Duration::ZERO;
        self.bootloader_hold = Duration::ZERO;
        self
    }

    /// Reject sizes the protocol cannot use.
    pub fn validate(&self) -> Result<()> {
        if self.segment_size == 0 {
            return Err(Error::InvalidArgument(
                "segment size must be at least 1".into(),
            ));
        }
        if self.transfer_chunk_size == 0 {
            return Err(Error::InvalidArgument(
                "transfer chunk size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
