//! Error handling for tradectl.
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the YAML configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error reading or accessing a configuration file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing YAML configuration.
    #[error("Invalid YAML format: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A `${VAR}` reference could not be resolved.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Defines all possible errors that can occur while sequencing unit operations.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unit names must be non-empty and use the systemd unit alphabet.
    #[error("Invalid unit name '{0}'")]
    InvalidUnitName(String),

    /// The unit definition to install does not exist.
    #[error("Unit source file not found: {}", path.display())]
    UnitSourceMissing {
        /// Path that was expected to hold the unit definition.
        path: PathBuf,
    },

    /// The unit source exists but could not be read.
    #[error("Failed to read unit source {}: {source}", path.display())]
    SourceReadError {
        /// Source unit file path.
        path: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// Staging the unit file into the unit directory failed.
    #[error("Failed to install unit file to {}: {source}", path.display())]
    InstallError {
        /// Destination that could not be written.
        path: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// Removing the installed unit file failed.
    #[error("Failed to remove unit file {}: {source}", path.display())]
    RemoveError {
        /// Installed unit file path.
        path: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// An external tool could not be launched at all.
    #[error("Failed to run '{program}': {source}")]
    CommandSpawnError {
        /// Program that failed to spawn.
        program: String,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// An external tool ran and reported failure.
    #[error("Step '{step}' failed: '{program}' exited with status {code:?}")]
    CommandFailed {
        /// Sequencer step that issued the command.
        step: String,
        /// Program that exited unsuccessfully.
        program: String,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
    },

    /// Output of `systemctl show` could not be interpreted.
    #[error("Unexpected status output for '{unit}': {reason}")]
    StatusParseError {
        /// Unit whose properties were queried.
        unit: String,
        /// What was wrong with the output.
        reason: String,
    },

    /// `render` was asked for but the unit has no template.
    #[error("Unit '{0}' has no template to render")]
    NoTemplate(String),

    /// Writing rendered or reported output failed.
    #[error("Failed to write output: {0}")]
    OutputError(#[from] std::io::Error),

    /// JSON serialisation of a status report failed.
    #[error("Failed to serialise status: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// The passwd database had no entry for the requested account.
    #[error("User '{0}' not found")]
    UnknownUser(String),

    /// Looking up the passwd database failed.
    #[error("User lookup failed: {0}")]
    ErrNo(#[from] nix::errno::Errno),

    /// The requested mode needs root.
    #[error("{0} requires root privileges")]
    PrivilegeRequired(String),
}
