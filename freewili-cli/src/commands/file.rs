//! File transfer, script and bitstream command implementations.

use anyhow::{Context, Result, bail};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;

use crate::commands::open_device;
use crate::{Settings, use_fancy_output};

/// Directory scripts are uploaded to when no target name is given.
const SCRIPTS_DIR: &str = "/scripts";

/// Target name for a local file sent without an explicit name.
fn default_target_name(source: &Path) -> Result<String> {
    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Cannot derive a file name from {}", source.display()))?;
    Ok(format!("{SCRIPTS_DIR}/{file_name}"))
}

fn progress_bar(settings: &Settings, total: usize) -> ProgressBar {
    if settings.quiet || !use_fancy_output() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total as u64);
    #[allow(clippy::unwrap_used)] // Static template string
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
    pb
}

/// Send-file command implementation.
pub(crate) fn cmd_send_file(settings: &Settings, source: &Path, name: Option<&str>) -> Result<()> {
    let target = match name {
        Some(name) => name.to_string(),
        None => default_target_name(source)?,
    };
    let data = fs::read(source).with_context(|| format!("Failed to read {}", source.display()))?;

    let mut device = open_device(settings)?;
    if !settings.quiet {
        eprintln!(
            "Sending {} to {} as {}",
            style(source.display()).yellow(),
            device.descriptor().port(),
            style(&target).cyan()
        );
    }

    let pb = progress_bar(settings, data.len());
    pb.set_message(target.clone());
    let report = device
        .send_data(&data, &target, |sent, _| pb.set_position(sent as u64))
        .with_context(|| format!("Failed to send {}", source.display()))?;
    pb.finish_and_clear();

    if !settings.quiet {
        eprintln!(
            "{} Sent {} bytes (checksum {})",
            style("✓").green(),
            report.size,
            report.checksum
        );
    }
    if !report.device_reply.is_empty() {
        println!("{}", report.device_reply);
    }
    Ok(())
}

/// Get-file command implementation.
pub(crate) fn cmd_get_file(settings: &Settings, source: &str, destination: &Path) -> Result<()> {
    let mut device = open_device(settings)?;
    let data = device
        .get_file(source)
        .with_context(|| format!("Failed to get {source}"))?;
    fs::write(destination, &data)
        .with_context(|| format!("Failed to write {}", destination.display()))?;

    if !settings.quiet {
        eprintln!(
            "{} Saved {} bytes to {}",
            style("✓").green(),
            data.len(),
            style(destination.display()).yellow()
        );
    }
    Ok(())
}

/// Run-script command implementation.
///
/// With `upload`, the local script is sent first; without a `name` the
/// uploaded script is the one that runs.
pub(crate) fn cmd_run_script(
    settings: &Settings,
    name: Option<&str>,
    upload: Option<&Path>,
) -> Result<()> {
    let script = match (name, upload) {
        (Some(name), _) => name.to_string(),
        (None, Some(source)) => default_target_name(source)?,
        (None, None) => bail!("No script name given, pass a NAME or --upload a script"),
    };

    if let Some(source) = upload {
        cmd_send_file(settings, source, Some(&default_target_name(source)?))?;
    }

    let mut device = open_device(settings)?;
    let output = device
        .run_script(&script)
        .with_context(|| format!("Failed to run {script}"))?;
    print!("{output}");
    Ok(())
}

/// Load-FPGA command implementation.
pub(crate) fn cmd_load_fpga(settings: &Settings, name: &str) -> Result<()> {
    let mut device = open_device(settings)?;
    let output = device
        .load_bitstream(name)
        .with_context(|| format!("Failed to load {name}"))?;
    print!("{output}");
    Ok(())
}
