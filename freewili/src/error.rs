//! Error types for freewili.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for freewili operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for freewili operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error on the serial stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serial port error.
    #[cfg(feature = "native")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// The port accepted fewer bytes than a command frame contains.
    #[error("Short write: only wrote {written} of {expected} bytes")]
    ShortWrite {
        /// Bytes accepted by the port.
        written: usize,
        /// Bytes in the frame.
        expected: usize,
    },

    /// A file download stopped because a payload chunk was not fully written.
    #[error("Transfer aborted at offset {offset}: wrote {written} of {expected} bytes")]
    TransferAborted {
        /// Offset of the failing chunk within the payload.
        offset: usize,
        /// Bytes of the chunk accepted by the port.
        written: usize,
        /// Size of the chunk.
        expected: usize,
    },

    /// The device replied with something that could not be decoded.
    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    /// Not enough data arrived before the read timeout elapsed.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Local file could not be read or written.
    #[error("Cannot access {}: {source}", path.display())]
    FileAccess {
        /// Path of the local file.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// No matching device is connected.
    #[error("No FreeWili device found")]
    DeviceNotFound,

    /// Device index outside of the discovered range.
    #[error("Index {index} is out of range, there are only {count} devices")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of devices found.
        count: usize,
    },

    /// Argument rejected before anything was sent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Coarse failure class of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Open, read or write failure of the underlying stream.
    Transport,
    /// Short write or undecodable reply.
    Framing,
    /// Insufficient data before the bounded wait elapsed.
    Timeout,
    /// Local filesystem failure.
    FileAccess,
    /// Caller supplied something unusable.
    Usage,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Transport,
            #[cfg(feature = "native")]
            Self::Serial(_) => ErrorKind::Transport,
            Self::ShortWrite { .. } | Self::TransferAborted { .. } | Self::MalformedReply(_) => {
                ErrorKind::Framing
            },
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::FileAccess { .. } => ErrorKind::FileAccess,
            Self::DeviceNotFound | Self::IndexOutOfRange { .. } | Self::InvalidArgument(_) => {
                ErrorKind::Usage
            },
        }
    }
}
