//! fwi-serial - Command-line tool for FreeWili boards.
//!
//! ## Features
//!
//! - List connected FreeWili processors
//! - Send and fetch files, run scripts, load FPGA bitstreams
//! - Drive IO pins and PWM
//! - SPI, I2C, radio and UART passthrough
//! - Reset into the UF2 bootloader
//! - Shell completion generation
//! - Environment variable and config file support

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use console::style;
use env_logger::Env;
use freewili::{Capabilities, IoLevel, LineEnding, ProcessorRole, ProtocolOptions};
use log::debug;
use std::env;
use std::path::PathBuf;

mod commands;
mod config;

use config::Config;

/// Whether stderr is a terminal (set once at startup).
static STDERR_IS_TTY: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Check if progress bars should be drawn (TTY and colors enabled).
fn use_fancy_output() -> bool {
    STDERR_IS_TTY.load(std::sync::atomic::Ordering::Relaxed) && console::colors_enabled_stderr()
}

/// fwi-serial - Control FreeWili boards over USB serial.
///
/// Environment variables:
///   FREEWILI_INDEX    - Default device index (1-based)
///   FREEWILI_CONFIG   - Path to a configuration file
#[derive(Parser)]
#[command(name = "fwi-serial")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Select a FreeWili by index. The first FreeWili is 1.
    #[arg(short, long, global = true, env = "FREEWILI_INDEX")]
    index: Option<usize>,

    /// Verbose output level (-v, -vv for increasing detail).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress non-essential output).
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a configuration file.
    #[arg(
        long = "config",
        global = true,
        value_name = "PATH",
        env = "FREEWILI_CONFIG"
    )]
    config_path: Option<PathBuf>,

    /// Line terminator appended to commands.
    #[arg(long, global = true, value_enum)]
    line_ending: Option<EolArg>,

    /// Payload bytes per passthrough exchange.
    #[arg(long, global = true)]
    segment_size: Option<usize>,

    /// Omit the checksum from file transfer headers (older firmware).
    #[arg(long, global = true)]
    no_checksum: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Line terminator choices.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum EolArg {
    /// "\n"
    Lf,
    /// "\r\n"
    Crlf,
}

impl From<EolArg> for LineEnding {
    fn from(eol: EolArg) -> Self {
        match eol {
            EolArg::Lf => LineEnding::Lf,
            EolArg::Crlf => LineEnding::CrLf,
        }
    }
}

/// Processor role filter.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    /// Main processor.
    Main,
    /// Display processor.
    Display,
}

impl From<RoleArg> for ProcessorRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Main => ProcessorRole::Main,
            RoleArg::Display => ProcessorRole::Display,
        }
    }
}

/// IO pin level.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LevelArg {
    /// Drive high.
    High,
    /// Drive low.
    Low,
}

impl From<LevelArg> for IoLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::High => IoLevel::High,
            LevelArg::Low => IoLevel::Low,
        }
    }
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// List all FreeWili processors connected to the computer.
    List {
        /// Output the device list as JSON to stdout.
        #[arg(long)]
        json: bool,

        /// Only list processors with this role.
        #[arg(long, value_enum)]
        role: Option<RoleArg>,
    },

    /// Send a file to the FreeWili.
    SendFile {
        /// Local file to send.
        source: PathBuf,

        /// Name of the file on the FreeWili (default: /scripts/<file name>).
        #[arg(short = 'n', long)]
        name: Option<String>,
    },

    /// Get a file from the FreeWili.
    GetFile {
        /// Name of the file on the FreeWili.
        source: String,

        /// Local destination path.
        destination: PathBuf,
    },

    /// Run a script on the FreeWili.
    RunScript {
        /// Script name on the FreeWili.
        name: Option<String>,

        /// Send this local script first; it runs when no name is given.
        #[arg(long, value_name = "SOURCE")]
        upload: Option<PathBuf>,
    },

    /// Load an FPGA bitstream stored on the FreeWili.
    LoadFpga {
        /// Bitstream name on the FreeWili.
        name: String,
    },

    /// Set an IO pin high or low.
    SetIo {
        /// IO pin number.
        pin: u32,

        /// Level to drive.
        #[arg(value_enum)]
        level: LevelArg,
    },

    /// Start PWM on an IO pin.
    Pwm {
        /// IO pin number.
        pin: u32,

        /// Frequency in Hz.
        freq: u32,

        /// Duty cycle in percent.
        duty: u32,
    },

    /// Read the state of all IO pins.
    GetIo,

    /// SPI transceive (hex bytes, e.g. "0A FF").
    Spi {
        /// Bytes to send.
        #[arg(required = true, value_parser = commands::parse_hex_byte)]
        data: Vec<u8>,
    },

    /// Write to the UART.
    Uart {
        /// Bytes to send.
        #[arg(required = true, value_parser = commands::parse_hex_byte)]
        data: Vec<u8>,
    },

    /// Send data over the radio.
    RadioWrite {
        /// Bytes to send.
        #[arg(required = true, value_parser = commands::parse_hex_byte)]
        data: Vec<u8>,
    },

    /// Read data from the radio.
    RadioRead {
        /// Bytes to send.
        #[arg(required = true, value_parser = commands::parse_hex_byte)]
        data: Vec<u8>,
    },

    /// Write to a register of an I2C device.
    I2cWrite {
        /// Device address (hex).
        #[arg(value_parser = commands::parse_hex_byte)]
        address: u8,

        /// Register (hex).
        #[arg(value_parser = commands::parse_hex_byte)]
        register: u8,

        /// Bytes to write (hex).
        #[arg(value_parser = commands::parse_hex_byte)]
        data: Vec<u8>,
    },

    /// Read from a register of an I2C device.
    I2cRead {
        /// Device address (hex).
        #[arg(value_parser = commands::parse_hex_byte)]
        address: u8,

        /// Register (hex).
        #[arg(value_parser = commands::parse_hex_byte)]
        register: u8,

        /// Number of bytes to read.
        size: u8,
    },

    /// Scan the I2C bus.
    I2cPoll,

    /// Reset the processor into the UF2 bootloader.
    ResetBootloader,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Effective device settings after config and command-line merging.
pub(crate) struct Settings {
    /// 1-based device index.
    pub index: usize,
    /// Framing and timing options for the device handle.
    pub options: ProtocolOptions,
    /// Firmware capabilities for the device handle.
    pub capabilities: Capabilities,
    pub quiet: bool,
}

impl Settings {
    fn resolve(cli: &Cli, config: &Config) -> Self {
        Self {
            index: cli.index.or(config.device.index).unwrap_or(1),
            options: config.protocol_options(cli.line_ending.map(Into::into), cli.segment_size),
            capabilities: config.capabilities(cli.no_checksum),
            quiet: cli.quiet,
        }
    }
}

fn main() {
    // --- NO_COLOR and TTY detection ---
    let stderr_is_tty = console::Term::stderr().is_term();
    STDERR_IS_TTY.store(stderr_is_tty, std::sync::atomic::Ordering::Relaxed);

    if env::var("NO_COLOR").is_ok() || !stderr_is_tty {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_target(cli.verbose >= 2)
        .format_timestamp(if cli.verbose >= 2 {
            Some(env_logger::TimestampPrecision::Millis)
        } else {
            None
        })
        .init();

    debug!(
        "fwi-serial v{} (verbose level: {})",
        env!("CARGO_PKG_VERSION"),
        cli.verbose
    );

    // Load configuration
    let config = if let Some(ref path) = cli.config_path {
        Config::load_from_path(path)
    } else {
        Config::load()
    };
    let settings = Settings::resolve(&cli, &config);

    if let Err(e) = run(&cli, &settings) {
        eprintln!("{} {e:#}", style("Error:").red().bold());
        std::process::exit(1);
    }
}

fn run(cli: &Cli, settings: &Settings) -> Result<()> {
    use commands::{bus, completions, file, io, list};

    match &cli.command {
        Commands::List { json, role } => list::cmd_list(*json, role.map(Into::into)),
        Commands::SendFile { source, name } => file::cmd_send_file(settings, source, name.as_deref()),
        Commands::GetFile {
            source,
            destination,
        } => file::cmd_get_file(settings, source, destination),
        Commands::RunScript { name, upload } => {
            file::cmd_run_script(settings, name.as_deref(), upload.as_deref())
        },
        Commands::LoadFpga { name } => file::cmd_load_fpga(settings, name),
        Commands::SetIo { pin, level } => io::cmd_set_io(settings, *pin, (*level).into()),
        Commands::Pwm { pin, freq, duty } => io::cmd_pwm(settings, *pin, *freq, *duty),
        Commands::GetIo => io::cmd_get_io(settings),
        Commands::Spi { data } => bus::cmd_spi(settings, data),
        Commands::Uart { data } => bus::cmd_uart(settings, data),
        Commands::RadioWrite { data } => bus::cmd_radio_write(settings, data),
        Commands::RadioRead { data } => bus::cmd_radio_read(settings, data),
        Commands::I2cWrite {
            address,
            register,
            data,
        } => bus::cmd_i2c_write(settings, *address, *register, data),
        Commands::I2cRead {
            address,
            register,
            size,
        } => bus::cmd_i2c_read(settings, *address, *register, *size),
        Commands::I2cPoll => bus::cmd_i2c_poll(settings),
        Commands::ResetBootloader => io::cmd_reset_bootloader(settings),
        Commands::Completions { shell } => {
            completions::cmd_completions(*shell);
            Ok(())
        },
    }
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_command_is_valid() {
        // Verifies that all derive macros produce a valid clap Command
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parse_send_file() {
        let cli = Cli::try_parse_from([
            "fwi-serial",
            "-i",
            "2",
            "send-file",
            "blink.wasm",
            "--name",
            "/scripts/b.wasm",
        ])
        .unwrap();
        assert_eq!(cli.index, Some(2));
        match cli.command {
            Commands::SendFile { source, name } => {
                assert_eq!(source, PathBuf::from("blink.wasm"));
                assert_eq!(name.as_deref(), Some("/scripts/b.wasm"));
            },
            _ => panic!("expected send-file"),
        }
    }

    #[test]
    fn test_cli_parse_set_io() {
        let cli = Cli::try_parse_from(["fwi-serial", "set-io", "25", "high"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::SetIo {
                pin: 25,
                level: LevelArg::High
            }
        ));
        assert!(Cli::try_parse_from(["fwi-serial", "set-io", "25", "up"]).is_err());
    }

    #[test]
    fn test_cli_parse_hex_payload() {
        let cli = Cli::try_parse_from(["fwi-serial", "spi", "0A", "ff", "0x10"]).unwrap();
        match cli.command {
            Commands::Spi { data } => assert_eq!(data, vec![0x0A, 0xFF, 0x10]),
            _ => panic!("expected spi"),
        }
        assert!(Cli::try_parse_from(["fwi-serial", "spi"]).is_err());
        assert!(Cli::try_parse_from(["fwi-serial", "spi", "100"]).is_err());
    }

    #[test]
    fn test_cli_parse_i2c_read() {
        let cli = Cli::try_parse_from(["fwi-serial", "i2c-read", "48", "00", "2"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::I2cRead {
                address: 0x48,
                register: 0x00,
                size: 2
            }
        ));
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "fwi-serial",
            "--line-ending",
            "crlf",
            "--segment-size",
            "16",
            "--no-checksum",
            "-vv",
            "get-io",
        ])
        .unwrap();
        assert!(matches!(cli.line_ending, Some(EolArg::Crlf)));
        assert_eq!(cli.segment_size, Some(16));
        assert!(cli.no_checksum);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_settings_resolution() {
        let mut config = Config::default();
        config.device.index = Some(3);
        config.protocol.segment_size = Some(4);

        let cli = Cli::try_parse_from(["fwi-serial", "get-io"]).unwrap();
        let settings = Settings::resolve(&cli, &config);
        assert_eq!(settings.index, 3);
        assert_eq!(settings.options.segment_size, 4);
        assert!(settings.capabilities.download_checksum);

        let cli = Cli::try_parse_from(["fwi-serial", "-i", "1", "--no-checksum", "get-io"])
            .unwrap();
        let settings = Settings::resolve(&cli, &config);
        assert_eq!(settings.index, 1);
        assert!(!settings.capabilities.download_checksum);
    }

    #[test]
    fn test_cli_list_role() {
        let cli = Cli::try_parse_from(["fwi-serial", "list", "--role", "display", "--json"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::List {
                json: true,
                role: Some(RoleArg::Display)
            }
        ));
    }

    #[test]
    fn test_cli_missing_subcommand() {
        assert!(Cli::try_parse_from(["fwi-serial"]).is_err());
    }
}
