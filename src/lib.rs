//! tradectl installs the `tradecopy` unit into systemd and drives it through
//! its lifecycle: stage the unit file, reload the manager, enable and start
//! the unit, keep the user manager alive with linger, and inspect, stop or
//! restart it afterwards. Each step is a single blocking call to `systemctl`,
//! `journalctl` or `loginctl`, issued in a fixed order.

/// CLI interface.
pub mod cli;

/// Configuration management.
pub mod config;

/// Error handling.
pub mod error;

/// External command invocation.
pub mod manager;

/// Current user and root checks.
pub mod privilege;

/// Runtime scope and directories.
pub mod runtime;

/// Lifecycle sequencing.
pub mod sequencer;

/// Structured unit status.
pub mod status;

/// Unit references and unit file staging.
pub mod unit;

#[doc(hidden)]
pub mod test_utils;
