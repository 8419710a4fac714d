//! Command-line interface for tradectl.
use std::str::FromStr;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

/// Wrapper around `LevelFilter` so clap can parse log levels from either
/// string names ("info", "debug", etc.) or numeric shorthands (0-5).
#[derive(Clone, Copy, Debug)]
pub struct LogLevelArg(LevelFilter);

impl LogLevelArg {
    /// String representation suitable for `RUST_LOG`.
    pub fn as_str(&self) -> &'static str {
        match self.0 {
            LevelFilter::OFF => "off",
            LevelFilter::ERROR => "error",
            LevelFilter::WARN => "warn",
            LevelFilter::INFO => "info",
            LevelFilter::DEBUG => "debug",
            LevelFilter::TRACE => "trace",
        }
    }
}

impl FromStr for LogLevelArg {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("log level cannot be empty".into());
        }

        if let Ok(number) = trimmed.parse::<u8>() {
            let level = match number {
                0 => LevelFilter::OFF,
                1 => LevelFilter::ERROR,
                2 => LevelFilter::WARN,
                3 => LevelFilter::INFO,
                4 => LevelFilter::DEBUG,
                5 => LevelFilter::TRACE,
                _ => {
                    return Err(format!(
                        "unsupported log level number '{number}' (expected 0-5)"
                    ));
                }
            };

            return Ok(LogLevelArg(level));
        }

        let level = match trimmed.to_ascii_lowercase().as_str() {
            "off" => Some(LevelFilter::OFF),
            "error" | "err" => Some(LevelFilter::ERROR),
            "warn" | "warning" => Some(LevelFilter::WARN),
            "info" => Some(LevelFilter::INFO),
            "debug" => Some(LevelFilter::DEBUG),
            "trace" => Some(LevelFilter::TRACE),
            _ => None,
        }
        .ok_or_else(|| format!("invalid log level '{trimmed}'"))?;

        Ok(LogLevelArg(level))
    }
}

/// Command-line interface for tradectl.
#[derive(Parser)]
#[command(name = "tradectl", version, author)]
#[command(about = "Installs and drives the tradecopy systemd unit", long_about = None)]
pub struct Cli {
    /// Override the logging verbosity for this invocation only.
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Path to the configuration file (defaults to `tradectl.yaml` if present).
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Target the system manager instead of the user manager. Requires root.
    #[arg(long = "sys", global = true)]
    pub sys: bool,

    /// Print the commands that would run without executing them.
    #[arg(long = "dry-run", global = true)]
    pub dry_run: bool,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for tradectl.
#[derive(Subcommand)]
pub enum Commands {
    /// Copy the unit file into the service manager's unit directory.
    Install,

    /// Ask the service manager to re-read unit files.
    Reload,

    /// Enable the unit for automatic start and start it now.
    Enable,

    /// Start the unit.
    Start,

    /// Stop the unit.
    Stop,

    /// Restart the unit.
    Restart,

    /// Show the unit's status as reported by the service manager.
    Status {
        /// Emit machine-readable JSON output instead of `systemctl status`.
        #[arg(long)]
        json: bool,
    },

    /// Show the unit's journal.
    Logs {
        /// Number of lines to show (default: 50).
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,

        /// Keep streaming new entries.
        #[arg(short, long)]
        follow: bool,
    },

    /// Keep the user's service manager running without a login session.
    Linger {
        /// Account to enable lingering for (defaults to the configured or current user).
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Install, reload, enable and start, then enable linger if configured.
    Deploy {
        /// Skip the linger step even when the config enables it.
        #[arg(long = "no-linger")]
        no_linger: bool,
    },

    /// Stop, disable and remove the unit, then reload.
    Uninstall,

    /// Render the configured unit template.
    Render {
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Parses command-line arguments and returns a `Cli` struct.
pub fn parse_args() -> Cli {
    Cli::parse()
}
