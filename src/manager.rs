//! Invocation of the external service manager, journal and login manager.
use std::{
    fmt,
    process::{Command, Stdio},
};
use strum_macros::{AsRefStr, Display};
use tracing::debug;

use crate::config::ToolsConfig;
use crate::error::ControlError;
use crate::runtime::RuntimeMode;

/// Named step of the lifecycle, used in logs and failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Step {
    Install,
    Reload,
    Enable,
    Disable,
    Start,
    Stop,
    Restart,
    Status,
    Logs,
    Linger,
    Uninstall,
}

/// A single external command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Capture stdout instead of passing it through to the terminal.
    pub capture: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            capture: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// What an external command reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Captured stdout; empty for pass-through invocations.
    pub stdout: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes invocations. The seam between sequencing and the host.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ControlError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ControlError> {
        (**self).run(invocation)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for Box<R> {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ControlError> {
        (**self).run(invocation)
    }
}

/// Runs commands on the host, blocking until each exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ControlError> {
        debug!("Running `{}`", invocation);

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);

        let spawn_error = |source| ControlError::CommandSpawnError {
            program: invocation.program.clone(),
            source,
        };

        if invocation.capture {
            let output = cmd
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit())
                .output()
                .map_err(spawn_error)?;
            Ok(CommandOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            })
        } else {
            let status = cmd.status().map_err(spawn_error)?;
            Ok(CommandOutput {
                code: status.code(),
                stdout: String::new(),
            })
        }
    }
}

/// Prints each command line instead of executing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ControlError> {
        eprintln!("would run: {invocation}");
        Ok(CommandOutput {
            code: Some(0),
            stdout: String::new(),
        })
    }
}

/// Properties queried for `status --json`.
pub const SHOW_PROPERTIES: &[&str] = &[
    "Id",
    "LoadState",
    "ActiveState",
    "SubState",
    "MainPID",
    "UnitFileState",
];

/// Builds and issues `systemctl`, `journalctl` and `loginctl` commands.
pub struct Systemd<R: CommandRunner> {
    runner: R,
    tools: ToolsConfig,
    mode: RuntimeMode,
}

impl<R: CommandRunner> Systemd<R> {
    pub fn new(runner: R, tools: ToolsConfig, mode: RuntimeMode) -> Self {
        Self {
            runner,
            tools,
            mode,
        }
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    fn scoped(&self, program: &str) -> Invocation {
        let invocation = Invocation::new(program);
        match self.mode.scope_flag() {
            Some(flag) => invocation.arg(flag),
            None => invocation,
        }
    }

    fn systemctl(&self) -> Invocation {
        self.scoped(&self.tools.systemctl)
    }

    /// Runs `invocation`, turning a non-zero exit into `CommandFailed`.
    fn checked(&self, step: Step, invocation: Invocation) -> Result<(), ControlError> {
        let output = self.runner.run(&invocation)?;
        if output.success() {
            Ok(())
        } else {
            Err(ControlError::CommandFailed {
                step: step.to_string(),
                program: invocation.program,
                code: output.code,
            })
        }
    }

    pub fn daemon_reload(&self) -> Result<(), ControlError> {
        self.checked(Step::Reload, self.systemctl().arg("daemon-reload"))
    }

    pub fn enable(&self, unit: &str) -> Result<(), ControlError> {
        self.checked(Step::Enable, self.systemctl().args(["enable", unit]))
    }

    pub fn disable(&self, unit: &str) -> Result<(), ControlError> {
        self.checked(Step::Disable, self.systemctl().args(["disable", unit]))
    }

    pub fn start(&self, unit: &str) -> Result<(), ControlError> {
        self.checked(Step::Start, self.systemctl().args(["start", unit]))
    }

    pub fn stop(&self, unit: &str) -> Result<(), ControlError> {
        self.checked(Step::Stop, self.systemctl().args(["stop", unit]))
    }

    pub fn restart(&self, unit: &str) -> Result<(), ControlError> {
        self.checked(Step::Restart, self.systemctl().args(["restart", unit]))
    }

    /// Passes `systemctl status` through and returns its exit code unchanged.
    pub fn status(&self, unit: &str) -> Result<Option<i32>, ControlError> {
        let invocation = self.systemctl().args(["status", unit, "--no-pager"]);
        Ok(self.runner.run(&invocation)?.code)
    }

    /// Captures `systemctl show` output for the given properties.
    pub fn show(&self, unit: &str, properties: &[&str]) -> Result<String, ControlError> {
        let invocation = self
            .systemctl()
            .args(["show", unit, "--no-pager"])
            .arg(format!("--property={}", properties.join(",")))
            .captured();
        let output = self.runner.run(&invocation)?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(ControlError::CommandFailed {
                step: Step::Status.to_string(),
                program: invocation.program,
                code: output.code,
            })
        }
    }

    /// Passes a journal query through and returns its exit code.
    pub fn journal(
        &self,
        unit: &str,
        lines: usize,
        follow: bool,
    ) -> Result<Option<i32>, ControlError> {
        let mut invocation = self
            .scoped(&self.tools.journalctl)
            .args(["-u", unit, "-n"])
            .arg(lines.to_string())
            .arg("--no-pager");
        if follow {
            invocation = invocation.arg("-f");
        }
        Ok(self.runner.run(&invocation)?.code)
    }

    /// Asks logind to keep `user`'s manager running without a session.
    pub fn enable_linger(&self, user: &str, escalate: bool) -> Result<(), ControlError> {
        let invocation = match self.tools.escalation() {
            Some((program, prefix_args)) if escalate => Invocation::new(program)
                .args(prefix_args)
                .arg(self.tools.loginctl.clone())
                .args(["enable-linger", user]),
            _ => Invocation::new(self.tools.loginctl.clone()).args(["enable-linger", user]),
        };
        self.checked(Step::Linger, invocation)
    }
}
