//! IO, PWM and bootloader command implementations.

use anyhow::{Context, Result};
use console::style;
use freewili::IoLevel;

use crate::Settings;
use crate::commands::open_device;

/// Set-IO command implementation.
pub(crate) fn cmd_set_io(settings: &Settings, pin: u32, level: IoLevel) -> Result<()> {
    let mut device = open_device(settings)?;
    if !settings.quiet {
        eprintln!("Setting IO pin {pin} to {}", style(level).cyan());
    }
    device
        .set_io(pin, level)
        .with_context(|| format!("Failed to set IO pin {pin}"))
}

/// PWM command implementation.
pub(crate) fn cmd_pwm(settings: &Settings, pin: u32, freq: u32, duty: u32) -> Result<()> {
    let mut device = open_device(settings)?;
    if !settings.quiet {
        eprintln!("PWM on IO pin {pin}: {freq} Hz, {duty}%");
    }
    device
        .generate_pwm(pin, freq, duty)
        .with_context(|| format!("Failed to start PWM on IO pin {pin}"))
}

/// Get-IO command implementation.
pub(crate) fn cmd_get_io(settings: &Settings) -> Result<()> {
    let mut device = open_device(settings)?;
    let bitmap = device.get_all_io().context("Failed to read IO state")?;
    println!("{}", format_io_bitmap(bitmap));
    Ok(())
}

fn format_io_bitmap(bitmap: u32) -> String {
    let high: Vec<String> = (0..32)
        .filter(|bit| bitmap & (1 << bit) != 0)
        .map(|bit: u32| bit.to_string())
        .collect();
    format!("{bitmap:#010x} (high: {})", high.join(", "))
}

/// Reset-bootloader command implementation.
pub(crate) fn cmd_reset_bootloader(settings: &Settings) -> Result<()> {
    let mut device = open_device(settings)?;
    device
        .reset_to_bootloader()
        .context("Failed to reset to the UF2 bootloader")?;
    if !settings.quiet {
        eprintln!(
            "{} {} is rebooting into the UF2 bootloader",
            style("✓").green(),
            device.descriptor().port()
        );
    }
    Ok(())
}
