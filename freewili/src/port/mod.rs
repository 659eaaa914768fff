//! Port abstraction for the serial link to a board.
//!
//! The protocol layer never touches `serialport` directly. It talks to a
//! [`Port`], which is a blocking byte stream with an explicit, idempotent
//! open/close lifecycle:
//!
//! ```text
//! +------------------+
//! |  FreeWili<P>     |   commands, passthrough, file transfer
//! +--------+---------+
//!          |
//!          v
//! +--------+---------+
//! |  Session guard   |   open, init once, close unless stay-open
//! +--------+---------+
//!          |
//!          v
//! +--------+---------+
//! |   Port trait     |
//! +--------+---------+
//!          |
//!          v
//! +--------+---------+
//! | NativePort       |
//! |  (serialport)    |
//! +------------------+
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::io::Write;
//!
//! use freewili::port::Port;
//!
//! fn example<P: Port>(port: &mut P) -> freewili::Result<()> {
//!     port.open()?;
//!     port.write_all(b"g\n")?;
//!     port.flush()?;
//!
//!     let mut buf = [0u8; 9];
//!     let n = port.read(&mut buf)?;
//!     println!("Received: {:?}", &buf[..n]);
//!
//!     port.close()
//! }
//! ```

#[cfg(feature = "native")]
pub mod native;

#[cfg(test)]
pub(crate) mod mock;

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use crate::error::Result;

/// Default baud rate of the FreeWili CDC interface.
pub const DEFAULT_BAUD: u32 = 115200;

/// Default read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Serial port configuration.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Port name/path (e.g., "/dev/ttyACM0", "COM3").
    pub port_name: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Read/write timeout.
    pub timeout: Duration,
    /// Data bits (typically 8).
    pub data_bits: DataBits,
    /// Parity (typically None).
    pub parity: Parity,
    /// Stop bits (typically One).
    pub stop_bits: StopBits,
    /// Flow control (typically None).
    pub flow_control: FlowControl,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD,
            timeout: DEFAULT_TIMEOUT,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
        }
    }
}

impl SerialConfig {
    /// Create a new configuration with port name and baud rate.
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            ..Default::default()
        }
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Number of data bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataBits {
    /// 5 data bits.
    Five,
    /// 6 data bits.
    Six,
    /// 7 data bits.
    Seven,
    /// 8 data bits.
    #[default]
    Eight,
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    /// No parity.
    #[default]
    None,
    /// Odd parity.
    Odd,
    /// Even parity.
    Even,
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopBits {
    /// 1 stop bit.
    #[default]
    One,
    /// 2 stop bits.
    Two,
}

/// Flow control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowControl {
    /// No flow control.
    #[default]
    None,
    /// Hardware flow control (RTS/CTS).
    Hardware,
    /// Software flow control (XON/XOFF).
    Software,
}

/// Serial port information as reported by the OS.
#[derive(Debug, Clone, Default)]
pub struct PortInfo {
    /// Port name/path.
    pub name: String,
    /// USB vendor ID (if available).
    pub vid: Option<u16>,
    /// USB product ID (if available).
    pub pid: Option<u16>,
    /// Serial number (if available).
    pub serial_number: Option<String>,
    /// USB topology location, e.g. `1-2.1:1.0` (if available).
    pub location: Option<String>,
}

/// Blocking serial stream bound to one device.
///
/// `open` and `close` are idempotent. Reads time out after the configured
/// timeout and report it as [`std::io::ErrorKind::TimedOut`].
pub trait Port: Read + Write + Send {
    /// Open the underlying device. No-op when already open.
    fn open(&mut self) -> Result<()>;

    /// Close the underlying device. No-op when already closed.
    fn close(&mut self) -> Result<()>;

    /// Whether the device is currently open.
    fn is_open(&self) -> bool;

    /// Get the port name/path.
    fn name(&self) -> &str;

    /// Set the baud rate. On a closed port this is applied at the next open.
    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()>;

    /// Get the current baud rate.
    fn baud_rate(&self) -> u32;

    /// Clear input/output buffers.
    fn clear_buffers(&mut self) -> Result<()>;

    /// Number of received bytes waiting to be read.
    fn bytes_to_read(&mut self) -> Result<usize>;
}

/// Read one byte, mapping a read timeout to `None`.
pub(crate) fn read_byte<P: Port + ?Sized>(port: &mut P) -> Result<Option<u8>> {
    let mut buf = [0u8; 1];
    match port.read(&mut buf) {
        Ok(1) => Ok(Some(buf[0])),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == ErrorKind::TimedOut => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Read until `\n` or until the stream goes quiet. The terminator is kept.
pub(crate) fn read_line<P: Port + ?Sized>(port: &mut P) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    while let Some(byte) = read_byte(port)? {
        line.push(byte);
        if byte == b'\n' {
            break;
        }
    }
    Ok(line)
}

/// Read up to `len` bytes, stopping early when the stream goes quiet.
pub(crate) fn read_up_to<P: Port + ?Sized>(port: &mut P, len: usize) -> Result<Vec<u8>> {
    let mut data = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        match port.read(&mut data[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::TimedOut => break,
            Err(e) => return Err(e.into()),
        }
    }
    data.truncate(filled);
    Ok(data)
}

/// Read until end-of-stream or until a read times out.
pub(crate) fn read_to_quiet<P: Port + ?Sized>(port: &mut P) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut buf = [0u8; 256];
    loop {
        match port.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => data.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == ErrorKind::TimedOut => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(data)
}

/// Read everything the driver has already buffered, without waiting.
pub(crate) fn drain_available<P: Port + ?Sized>(port: &mut P) -> Result<Vec<u8>> {
    let available = port.bytes_to_read()?;
    if available == 0 {
        return Ok(Vec::new());
    }
    read_up_to(port, available)
}

/// Trait for listing available serial ports.
///
/// This is separated from `Port` because it's a static operation that
/// doesn't require an open port instance.
pub trait PortEnumerator {
    /// List all available serial ports.
    fn list_ports() -> Result<Vec<PortInfo>>;
}

#[cfg(feature = "native")]
pub use native::{NativePort, NativePortEnumerator};
