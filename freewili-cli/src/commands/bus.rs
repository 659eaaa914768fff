//! Bus passthrough command implementations.

use anyhow::{Context, Result};
use freewili::Passthrough;
use freewili::protocol::hex;

use crate::Settings;
use crate::commands::open_device;

fn exchange(settings: &Settings, bus: Passthrough, data: &[u8]) -> Result<()> {
    let mut device = open_device(settings)?;
    let reply = device
        .passthrough(bus, data)
        .with_context(|| format!("Passthrough '{}' failed", bus.tag()))?;
    println!("{}", hex::encode(&reply));
    Ok(())
}

/// SPI command implementation.
pub(crate) fn cmd_spi(settings: &Settings, data: &[u8]) -> Result<()> {
    exchange(settings, Passthrough::Spi, data)
}

/// UART command implementation.
pub(crate) fn cmd_uart(settings: &Settings, data: &[u8]) -> Result<()> {
    exchange(settings, Passthrough::Uart, data)
}

/// Radio-write command implementation.
pub(crate) fn cmd_radio_write(settings: &Settings, data: &[u8]) -> Result<()> {
    exchange(settings, Passthrough::RadioWrite, data)
}

/// Radio-read command implementation.
pub(crate) fn cmd_radio_read(settings: &Settings, data: &[u8]) -> Result<()> {
    exchange(settings, Passthrough::RadioRead, data)
}

/// I2C-write command implementation.
pub(crate) fn cmd_i2c_write(
    settings: &Settings,
    address: u8,
    register: u8,
    data: &[u8],
) -> Result<()> {
    let mut device = open_device(settings)?;
    let reply = device
        .write_i2c(address, register, data)
        .with_context(|| format!("I2C write to {address:#04x} failed"))?;
    println!("{}", hex::encode(&reply));
    Ok(())
}

/// I2C-read command implementation.
pub(crate) fn cmd_i2c_read(settings: &Settings, address: u8, register: u8, size: u8) -> Result<()> {
    let mut device = open_device(settings)?;
    let reply = device
        .read_i2c(address, register, size)
        .with_context(|| format!("I2C read from {address:#04x} failed"))?;
    println!("{}", hex::encode(&reply));
    Ok(())
}

/// I2C-poll command implementation.
pub(crate) fn cmd_i2c_poll(settings: &Settings) -> Result<()> {
    let mut device = open_device(settings)?;
    let found = device.poll_i2c().context("I2C scan failed")?;
    if !settings.quiet {
        eprintln!("Found {} I2C device(s)", found.len());
    }
    for address in found {
        println!("{address:#04x}");
    }
    Ok(())
}
