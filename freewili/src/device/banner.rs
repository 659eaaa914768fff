//! Firmware banner parsing.
//!
//! When the menu is enabled the firmware prints a banner such as
//!
//! ```text
//! FreeWili
//! Main Processor App version 47
//! ```
//!
//! The line naming the processor carries exactly three interesting tokens:
//! the role, the literal `App version`, and the version number.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::device::AppInfo;

#[allow(clippy::unwrap_used)] // Static pattern
static BANNER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:Main|Display)|(?:App version)|(?:\d+)").unwrap());

/// Classify a banner. Anything unexpected yields [`AppInfo::Unknown`].
pub fn parse_banner(banner: &str) -> AppInfo {
    let line = banner
        .lines()
        .find(|line| line.contains("Processor"))
        .or_else(|| banner.lines().last())
        .unwrap_or_default();

    let tokens: Vec<&str> = BANNER_TOKEN
        .find_iter(line)
        .map(|m| m.as_str())
        .collect();
    let [role, _, version] = tokens.as_slice() else {
        debug!("Unrecognized banner line: {line:?}");
        return AppInfo::Unknown;
    };

    let Ok(version) = version.parse::<u32>() else {
        debug!("Banner version is not a number: {version:?}");
        return AppInfo::Unknown;
    };

    if role.contains("Main") {
        AppInfo::Main(version)
    } else if role.contains("Display") {
        AppInfo::Display(version)
    } else {
        debug!("Banner role not recognized: {role:?}");
        AppInfo::Unknown
    }
}
