//! Configuration file support for fwi-serial.
//!
//! Configuration is loaded from multiple sources with the following priority (highest first):
//! 1. Command-line arguments
//! 2. Environment variables (FREEWILI_*)
//! 3. Local config file (./freewili.toml)
//! 4. Global config file (~/.config/freewili/config.toml)
//!
//! ```toml
//! [device]
//! index = 2
//!
//! [protocol]
//! segment_size = 16
//! line_ending = "crlf"
//! checksum = false
//! i2c_scan = "literal-value"
//! ```

use directories::ProjectDirs;
use freewili::{Capabilities, I2cScanPolicy, LineEnding, ProtocolOptions};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory config file.
pub const LOCAL_CONFIG_FILE: &str = "freewili.toml";

/// Device selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// 1-based index into the discovered devices.
    pub index: Option<usize>,
}

/// Protocol settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Payload bytes per passthrough exchange.
    pub segment_size: Option<usize>,
    /// Command line terminator.
    pub line_ending: Option<LineEnding>,
    /// Whether the download header carries the checksum.
    pub checksum: Option<bool>,
    /// Interpretation of I2C scan rows.
    pub i2c_scan: Option<I2cScanPolicy>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Device selection.
    #[serde(default)]
    pub device: DeviceConfig,
    /// Protocol settings.
    #[serde(default)]
    pub protocol: ProtocolConfig,
}

impl Config {
    /// Load configuration from all available sources.
    pub fn load() -> Self {
        let mut config = Self::default();

        // Load global config
        if let Some(global_config) = Self::global_config_path()
            .as_deref()
            .and_then(Self::load_from_file)
        {
            debug!("Loaded global config");
            config.merge(global_config);
        }

        // Load local config (overrides global)
        if let Some(local_config) = Self::load_from_file(Path::new(LOCAL_CONFIG_FILE)) {
            debug!("Loaded local config from {LOCAL_CONFIG_FILE}");
            config.merge(local_config);
        }

        config
    }

    /// Load configuration from a specific file path (--config flag).
    pub fn load_from_path(path: &Path) -> Self {
        if let Some(config) = Self::load_from_file(path) {
            debug!("Loaded config from {}", path.display());
            config
        } else {
            warn!(
                "Could not load config from {}, using defaults",
                path.display()
            );
            Self::default()
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!("Failed to parse config file {}: {}", path.display(), e);
                    None
                },
            },
            Err(e) => {
                warn!("Failed to read config file {}: {}", path.display(), e);
                None
            },
        }
    }

    /// Get the global configuration directory.
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "freewili").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the global configuration file path.
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Merge another config into this one; set fields of `other` win.
    fn merge(&mut self, other: Self) {
        if other.device.index.is_some() {
            self.device.index = other.device.index;
        }
        if other.protocol.segment_size.is_some() {
            self.protocol.segment_size = other.protocol.segment_size;
        }
        if other.protocol.line_ending.is_some() {
            self.protocol.line_ending = other.protocol.line_ending;
        }
        if other.protocol.checksum.is_some() {
            self.protocol.checksum = other.protocol.checksum;
        }
        if other.protocol.i2c_scan.is_some() {
            self.protocol.i2c_scan = other.protocol.i2c_scan;
        }
    }

    /// Protocol options with command-line overrides applied on top.
    pub fn protocol_options(
        &self,
        line_ending: Option<LineEnding>,
        segment_size: Option<usize>,
    ) -> ProtocolOptions {
        let mut options = ProtocolOptions::default();
        if let Some(line_ending) = line_ending.or(self.protocol.line_ending) {
            options.line_ending = line_ending;
        }
        if let Some(segment_size) = segment_size.or(self.protocol.segment_size) {
            options.segment_size = segment_size;
        }
        options
    }

    /// Firmware capabilities; `no_checksum` from the command line wins.
    pub fn capabilities(&self, no_checksum: bool) -> Capabilities {
        let defaults = Capabilities::default();
        Capabilities {
            download_checksum: !no_checksum
                && self
                    .protocol
                    .checksum
                    .unwrap_or(defaults.download_checksum),
            i2c_scan: self.protocol.i2c_scan.unwrap_or(defaults.i2c_scan),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.device.index.is_none());
        assert!(config.protocol.segment_size.is_none());
        assert!(config.protocol.line_ending.is_none());
        assert!(config.protocol.checksum.is_none());
        assert!(config.protocol.i2c_scan.is_none());
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.device.index = Some(1);
        base.protocol.segment_size = Some(4);

        let mut other = Config::default();
        other.device.index = Some(3);
        other.protocol.checksum = Some(false);

        base.merge(other);
        assert_eq!(base.device.index, Some(3));
        assert_eq!(base.protocol.segment_size, Some(4));
        assert_eq!(base.protocol.checksum, Some(false));
    }

    #[test]
    fn test_config_merge_does_not_overwrite_with_none() {
        let mut base = Config::default();
        base.protocol.line_ending = Some(LineEnding::CrLf);
        base.merge(Config::default());
        assert_eq!(base.protocol.line_ending, Some(LineEnding::CrLf));
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
[device]
index = 2

[protocol]
segment_size = 16
line_ending = "crlf"
checksum = false
i2c_scan = "literal-value"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.device.index, Some(2));
        assert_eq!(config.protocol.segment_size, Some(16));
        assert_eq!(config.protocol.line_ending, Some(LineEnding::CrLf));
        assert_eq!(config.protocol.checksum, Some(false));
        assert_eq!(config.protocol.i2c_scan, Some(I2cScanPolicy::LiteralValue));
    }

    #[test]
    fn test_config_from_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.device.index.is_none());
        assert!(config.protocol.segment_size.is_none());
    }

    #[test]
    fn test_config_rejects_unknown_line_ending() {
        let result: Result<Config, _> = toml::from_str("[protocol]\nline_ending = \"cr\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_protocol_options_override_order() {
        let mut config = Config::default();
        config.protocol.segment_size = Some(16);
        config.protocol.line_ending = Some(LineEnding::CrLf);

        let options = config.protocol_options(None, None);
        assert_eq!(options.segment_size, 16);
        assert_eq!(options.line_ending, LineEnding::CrLf);

        let options = config.protocol_options(Some(LineEnding::Lf), Some(2));
        assert_eq!(options.segment_size, 2);
        assert_eq!(options.line_ending, LineEnding::Lf);

        let options = Config::default().protocol_options(None, None);
        assert_eq!(options.segment_size, 8);
    }

    #[test]
    fn test_capabilities() {
        let mut config = Config::default();
        assert!(config.capabilities(false).download_checksum);
        assert!(!config.capabilities(true).download_checksum);

        config.protocol.checksum = Some(false);
        config.protocol.i2c_scan = Some(I2cScanPolicy::LiteralValue);
        let caps = config.capabilities(false);
        assert!(!caps.download_checksum);
        assert_eq!(caps.i2c_scan, I2cScanPolicy::LiteralValue);
    }

    #[test]
    fn test_load_from_path_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[device]\nindex = 4\n").unwrap();

        let config = Config::load_from_path(&path);
        assert_eq!(config.device.index, Some(4));
    }

    #[test]
    fn test_load_from_path_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "invalid toml [[[").unwrap();

        let config = Config::load_from_path(&path);
        assert!(config.device.index.is_none());
    }

    #[test]
    fn test_load_from_path_nonexistent() {
        let config = Config::load_from_path(Path::new("/nonexistent/path/config.toml"));
        assert!(config.device.index.is_none());
    }

    #[test]
    fn test_global_config_path() {
        if let Some(p) = Config::global_config_path() {
            let p = p.to_string_lossy();
            assert!(p.contains("freewili"));
            assert!(p.ends_with("config.toml"));
        }
    }
}
