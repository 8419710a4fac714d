//! The lifecycle sequencer: stage, reload, enable/start, linger, and the
//! day-to-day verbs against the installed unit.
//!
//! Every operation is a single blocking pass over external commands issued in
//! a fixed order. A multi-step run stops at the first failure; nothing is
//! retried.
use std::path::PathBuf;

use strum_macros::{AsRefStr, Display};
use tracing::{error, info, warn};

use crate::config::{Config, UnitSource};
use crate::error::ControlError;
use crate::manager::{CommandRunner, SHOW_PROPERTIES, Step, Systemd};
use crate::privilege;
use crate::runtime::{self, RuntimeMode};
use crate::status::{UnitStatus, parse_show_output};
use crate::unit::{InstallOutcome, UnitRef};

/// Result of a linger request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum LingerOutcome {
    /// logind was asked to enable lingering.
    Enabled,
    /// Lingering was already on; nothing was run.
    AlreadyEnabled,
    /// Lingering does not apply to the system manager.
    Skipped,
}

/// Linger settings resolved from configuration.
#[derive(Debug, Clone)]
pub struct LingerPlan {
    /// Whether `deploy` includes the linger step.
    pub enabled: bool,
    /// Account to enable; `None` means the invoking user.
    pub user: Option<String>,
    /// Directory logind writes one marker file per lingering user into.
    pub state_dir: PathBuf,
}

/// Summary of a completed deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployReport {
    pub install: InstallOutcome,
    pub linger: Option<LingerOutcome>,
}

/// Drives one unit through its lifecycle against a service manager.
pub struct Sequencer<R: CommandRunner> {
    unit: UnitRef,
    source: UnitSource,
    manager: Systemd<R>,
    linger: LingerPlan,
    dry_run: bool,
}

impl<R: CommandRunner> Sequencer<R> {
    pub fn new(
        unit: UnitRef,
        source: UnitSource,
        manager: Systemd<R>,
        linger: LingerPlan,
        dry_run: bool,
    ) -> Self {
        Self {
            unit,
            source,
            manager,
            linger,
            dry_run,
        }
    }

    /// Builds a sequencer for the configured unit, using the runtime scope's
    /// directories unless the config overrides them.
    pub fn from_config(
        config: &Config,
        runner: R,
        dry_run: bool,
    ) -> Result<Self, ControlError> {
        let mode = runtime::mode();
        let unit_dir = config.install_dir().unwrap_or_else(runtime::unit_dir);
        let source = config.unit_source();
        let source_path = match &source {
            UnitSource::File(path) => Some(path.clone()),
            UnitSource::Template(_) => None,
        };

        let unit = UnitRef::new(&config.unit.name, source_path, &unit_dir)?;
        let manager = Systemd::new(runner, config.tools.clone(), mode);
        let linger = LingerPlan {
            enabled: config.linger.enabled,
            user: config.linger.user.clone(),
            state_dir: config.linger_dir().unwrap_or_else(runtime::linger_dir),
        };

        Ok(Self::new(unit, source, manager, linger, dry_run))
    }

    pub fn unit(&self) -> &UnitRef {
        &self.unit
    }

    /// Copies (or renders) the unit definition into the unit directory.
    pub fn install(&self) -> Result<InstallOutcome, ControlError> {
        if self.dry_run {
            let (_, outcome) = self.unit.plan(&self.source)?;
            let origin = self
                .unit
                .source_path()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<template>".into());
            eprintln!(
                "would install: {origin} -> {} ({outcome})",
                self.unit.install_path().display()
            );
            return Ok(outcome);
        }

        self.unit.install(&self.source)
    }

    /// Asks the manager to re-read unit files.
    pub fn reload(&self) -> Result<(), ControlError> {
        info!("Reloading {} service manager", scope_label(self.manager.mode()));
        self.manager.daemon_reload()
    }

    /// Registers the unit for automatic start, then starts it now.
    pub fn enable_and_start(&self) -> Result<(), ControlError> {
        let unit = self.unit.unit_name();
        info!("Enabling and starting {unit}");
        self.manager.enable(&unit)?;
        self.manager.start(&unit)
    }

    /// Turns on lingering for `user` (or the configured/invoking user).
    ///
    /// A user that already lingers is left alone, so calling this repeatedly
    /// has the same effect as calling it once.
    pub fn enable_linger(&self, user: Option<&str>) -> Result<LingerOutcome, ControlError> {
        if self.manager.mode() == RuntimeMode::System {
            warn!("Linger applies to user managers only; skipping");
            return Ok(LingerOutcome::Skipped);
        }

        let user = match user.or(self.linger.user.as_deref()) {
            Some(name) => name.to_string(),
            None => privilege::current_username()?,
        };
        privilege::ensure_user_exists(&user)?;

        if self.linger.state_dir.join(&user).exists() {
            info!("Linger already enabled for '{user}'");
            return Ok(LingerOutcome::AlreadyEnabled);
        }

        info!("Enabling linger for '{user}'");
        self.manager.enable_linger(&user, !privilege::is_root())?;
        Ok(LingerOutcome::Enabled)
    }

    /// Passes `status` through; returns the manager's exit code.
    pub fn status(&self) -> Result<Option<i32>, ControlError> {
        self.manager.status(&self.unit.unit_name())
    }

    /// Queries unit properties into a structured report.
    ///
    /// In dry-run mode the query is only printed and no report is produced.
    pub fn status_report(&self) -> Result<Option<UnitStatus>, ControlError> {
        let unit = self.unit.unit_name();
        let output = self.manager.show(&unit, SHOW_PROPERTIES)?;
        if self.dry_run {
            return Ok(None);
        }
        let mut status = parse_show_output(&unit, &output)?;

        if self.manager.mode() == RuntimeMode::User
            && let Some(user) = self
                .linger
                .user
                .clone()
                .or_else(|| privilege::current_username().ok())
        {
            status.linger = Some(self.linger.state_dir.join(user).exists());
        }

        Ok(Some(status))
    }

    /// Passes the journal query through; returns its exit code.
    pub fn logs(&self, lines: usize, follow: bool) -> Result<Option<i32>, ControlError> {
        self.manager.journal(&self.unit.unit_name(), lines, follow)
    }

    pub fn start(&self) -> Result<(), ControlError> {
        self.manager.start(&self.unit.unit_name())
    }

    pub fn stop(&self) -> Result<(), ControlError> {
        self.manager.stop(&self.unit.unit_name())
    }

    pub fn restart(&self) -> Result<(), ControlError> {
        self.manager.restart(&self.unit.unit_name())
    }

    /// Runs the whole runbook in order: install, reload, enable and start,
    /// then linger when configured and `with_linger` is set.
    pub fn deploy(&self, with_linger: bool) -> Result<DeployReport, ControlError> {
        let install = self
            .install()
            .inspect_err(|err| abort(Step::Install, err))?;
        self.reload().inspect_err(|err| abort(Step::Reload, err))?;

        let unit = self.unit.unit_name();
        info!("Enabling and starting {unit}");
        self.manager
            .enable(&unit)
            .inspect_err(|err| abort(Step::Enable, err))?;
        self.manager
            .start(&unit)
            .inspect_err(|err| abort(Step::Start, err))?;

        let linger = if with_linger && self.linger.enabled {
            Some(
                self.enable_linger(None)
                    .inspect_err(|err| abort(Step::Linger, err))?,
            )
        } else {
            None
        };

        info!("Deployed {}", self.unit.unit_name());
        Ok(DeployReport { install, linger })
    }

    /// Stops and disables the unit, removes its file and reloads.
    ///
    /// Stop and disable failures are tolerated so that a broken or already
    /// stopped unit can still be removed.
    pub fn uninstall(&self) -> Result<bool, ControlError> {
        let unit = self.unit.unit_name();

        if let Err(err) = self.manager.stop(&unit) {
            warn!("Ignoring stop failure while uninstalling {unit}: {err}");
        }
        if let Err(err) = self.manager.disable(&unit) {
            warn!("Ignoring disable failure while uninstalling {unit}: {err}");
        }

        let removed = if self.dry_run {
            eprintln!("would remove: {}", self.unit.install_path().display());
            self.unit.is_installed()
        } else {
            self.unit.remove()?
        };
        if !removed {
            warn!("No unit file at {}", self.unit.install_path().display());
        }

        self.reload()?;
        Ok(removed)
    }
}

fn abort(step: Step, err: &ControlError) {
    error!("Deploy aborted at step '{step}': {err}");
}

fn scope_label(mode: RuntimeMode) -> &'static str {
    match mode {
        RuntimeMode::User => "user",
        RuntimeMode::System => "system",
    }
}
