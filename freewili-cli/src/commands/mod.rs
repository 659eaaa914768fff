//! Command implementations.
//!
//! Each group of subcommands is implemented in its own module; this module
//! holds the pieces they share.

pub(crate) mod bus;
pub(crate) mod completions;
pub(crate) mod file;
pub(crate) mod io;
pub(crate) mod list;

use anyhow::{Context, Result, bail};
use freewili::{FreeWili, NativePort, host};
use log::debug;

use crate::Settings;

/// Find the device selected by the 1-based index and apply the settings.
pub(crate) fn open_device(settings: &Settings) -> Result<FreeWili<NativePort>> {
    if settings.index == 0 {
        bail!("Device index is 1-based, the first FreeWili is 1");
    }
    let devices = host::enumerate(None).context("Failed to enumerate FreeWili devices")?;
    let count = devices.len();
    let device = match host::select(devices, settings.index - 1) {
        Ok(device) => device,
        Err(freewili::Error::IndexOutOfRange { .. }) => bail!(
            "Index {} is out of range. There are only {count} devices.",
            settings.index
        ),
        Err(e) => return Err(e.into()),
    };
    debug!("Using {device}");

    Ok(device
        .with_options(settings.options.clone())
        .with_capabilities(settings.capabilities))
}

/// Parse one byte given as hex (`0A`, `a`, `0x0a`).
pub(crate) fn parse_hex_byte(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u8::from_str_radix(digits, 16).map_err(|e| format!("Invalid hex byte '{s}': {e}"))
}
