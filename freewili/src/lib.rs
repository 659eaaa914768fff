//! # freewili
//!
//! A library for controlling FreeWili boards over their USB serial ports.
//!
//! This crate provides:
//!
//! - Discovery of connected boards and classification of each port as the
//!   Main or Display processor
//! - IO and PWM control
//! - Binary passthrough to SPI, I2C, radio and UART, framed as ASCII hex
//! - File transfer to and from the board with the 24-bit rolling checksum
//! - Script and FPGA bitstream execution
//! - Reset into the UF2 bootloader
//!
//! ## Supported Platforms
//!
//! - **Native** (default): Linux, macOS, Windows via the `serialport` crate
//!
//! ## Features
//!
//! - `native` (default): Native serial port support
//! - `serde`: Serialization support for descriptors and options
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use freewili::{IoLevel, ProcessorRole, host};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     #[cfg(feature = "native")]
//!     {
//!         for mut board in host::enumerate(Some(ProcessorRole::Main))? {
//!             println!("{board}");
//!             board.set_io(25, IoLevel::High)?;
//!
//!             let report = board.send_file(
//!                 Path::new("blink.wasm"),
//!                 "/scripts/blink.wasm",
//!                 |sent, total| println!("{sent}/{total}"),
//!             )?;
//!             println!("Device said: {}", report.device_reply);
//!
//!             print!("{}", board.run_script("/scripts/blink.wasm")?);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod board;
pub mod device;
pub mod error;
pub mod host;
pub mod port;
pub mod protocol;
pub mod session;

// Re-exports for convenience
// Native-specific re-exports
#[cfg(feature = "native")]
pub use port::{NativePort, NativePortEnumerator};
pub use {
    board::{BOOTLOADER_BAUD, FreeWili},
    device::{
        AppInfo, DeviceDescriptor, FREEWILI_PID, FREEWILI_VID, ProcessorRole, format_device_list,
        parse_banner,
    },
    error::{Error, ErrorKind, Result},
    port::{Port, PortEnumerator, PortInfo, SerialConfig},
    protocol::{
        Capabilities, I2cScanPolicy, IoLevel, LineEnding, Passthrough, ProtocolOptions,
        TransferReport, checksum,
    },
    session::ChannelState,
};
