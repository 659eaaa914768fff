//! Device identity: USB identifiers, processor role, and descriptors.

pub mod banner;

use std::fmt;

use crate::port::PortInfo;

pub use banner::parse_banner;

/// Raspberry Pi vendor ID.
pub const FREEWILI_VID: u16 = 0x2E8A;

/// Pico SDK CDC UART product ID.
pub const FREEWILI_PID: u16 = 0x000A;

/// Which processor of the board a port talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProcessorRole {
    /// Not classified.
    Unknown,
    /// Main controller.
    Main,
    /// Display controller.
    Display,
}

impl ProcessorRole {
    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Main => "Main",
            Self::Display => "Display",
        }
    }
}

impl fmt::Display for ProcessorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Firmware identity reported by the banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AppInfo {
    /// Not classified yet, or the banner was not understood.
    #[default]
    Unknown,
    /// Main processor firmware with its version.
    Main(u32),
    /// Display processor firmware with its version.
    Display(u32),
}

impl AppInfo {
    /// Processor role.
    pub fn role(self) -> ProcessorRole {
        match self {
            Self::Unknown => ProcessorRole::Unknown,
            Self::Main(_) => ProcessorRole::Main,
            Self::Display(_) => ProcessorRole::Display,
        }
    }

    /// Firmware version, 0 when unknown.
    pub fn version(self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::Main(v) | Self::Display(v) => v,
        }
    }

    /// Whether a role has been established.
    pub fn is_classified(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Combine with a newer observation. A classified value is never replaced
    /// by `Unknown`.
    #[must_use]
    pub fn upgrade(self, observed: Self) -> Self {
        if observed.is_classified() { observed } else { self }
    }
}

impl fmt::Display for AppInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.role(), self.version())
    }
}

/// Immutable description of one board port.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceDescriptor {
    port: String,
    serial: Option<String>,
    location: Option<String>,
    vid: Option<u16>,
    pid: Option<u16>,
    app_info: AppInfo,
}

impl DeviceDescriptor {
    /// Describe a port by name only.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            serial: None,
            location: None,
            vid: None,
            pid: None,
            app_info: AppInfo::Unknown,
        }
    }

    /// Build an unclassified descriptor from enumeration data.
    pub fn from_port_info(info: &PortInfo) -> Self {
        Self {
            port: info.name.clone(),
            serial: info.serial_number.clone(),
            location: info.location.clone(),
            vid: info.vid,
            pid: info.pid,
            app_info: AppInfo::Unknown,
        }
    }

    /// Port name/path.
    pub fn port(&self) -> &str {
        &self.port
    }

    /// USB serial number.
    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// USB topology location.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// USB vendor ID.
    pub fn vid(&self) -> Option<u16> {
        self.vid
    }

    /// USB product ID.
    pub fn pid(&self) -> Option<u16> {
        self.pid
    }

    /// Firmware identity.
    pub fn app_info(&self) -> AppInfo {
        self.app_info
    }

    /// A new descriptor carrying `observed`, applying the no-downgrade rule.
    #[must_use]
    pub fn reclassified(&self, observed: AppInfo) -> Self {
        Self {
            app_info: self.app_info.upgrade(observed),
            ..self.clone()
        }
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {}",
            self.app_info,
            self.port,
            self.location.as_deref().unwrap_or("?")
        )
    }
}

/// Whether enumeration data matches the FreeWili USB identifiers.
pub fn is_freewili(info: &PortInfo) -> bool {
    info.vid == Some(FREEWILI_VID) && info.pid == Some(FREEWILI_PID)
}

/// Format descriptors for display, one per line, numbered from 1.
pub fn format_device_list(devices: &[DeviceDescriptor]) -> Vec<String> {
    devices
        .iter()
        .enumerate()
        .map(|(i, device)| {
            let serial = device
                .serial()
                .map(|s| format!(" [{s}]"))
                .unwrap_or_default();
            format!("{}. {device}{serial}", i + 1)
        })
        .collect()
}
