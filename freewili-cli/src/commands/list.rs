//! Device listing.

use {
    anyhow::{Context, Result},
    console::style,
    freewili::{DeviceDescriptor, ProcessorRole, format_device_list, host},
};

/// JSON view of one descriptor.
fn device_json(index: usize, device: &DeviceDescriptor) -> serde_json::Value {
    serde_json::json!({
        "index": index,
        "port": device.port(),
        "serial": device.serial(),
        "location": device.location(),
        "role": device.app_info().role().name(),
        "version": device.app_info().version(),
    })
}

/// List command implementation.
pub(crate) fn cmd_list(json: bool, role: Option<ProcessorRole>) -> Result<()> {
    let devices: Vec<DeviceDescriptor> = host::enumerate(role)
        .context("Failed to enumerate FreeWili devices")?
        .iter()
        .map(|board| board.descriptor().clone())
        .collect();

    if json {
        let list: Vec<serde_json::Value> = devices
            .iter()
            .enumerate()
            .map(|(i, device)| device_json(i + 1, device))
            .collect();
        let output = serde_json::json!({
            "ok": true,
            "data": {
                "devices": list,
            }
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    eprintln!(
        "{}",
        style(format!("Found {} FreeWili(s)", devices.len()))
            .bold()
            .underlined()
    );
    for line in format_device_list(&devices) {
        println!("\t{line}");
    }
    Ok(())
}
