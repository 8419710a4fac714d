//! Unit references, unit file staging and template rendering.
use sha2::{Digest, Sha256};
use std::{
    fmt::Write as _,
    fs, io,
    path::{Path, PathBuf},
};
use strum_macros::{AsRefStr, Display};
use tracing::{debug, info};

use crate::config::{UnitSource, UnitTemplate};
use crate::error::ControlError;

const UNIT_SUFFIX: &str = ".service";

/// Identity of the managed unit and where its definition lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRef {
    name: String,
    source_path: Option<PathBuf>,
    install_path: PathBuf,
}

/// Result of staging the unit file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum InstallOutcome {
    /// No unit file existed at the destination.
    Installed,
    /// The destination existed with different content.
    Updated,
    /// The destination already matched the source.
    Unchanged,
}

/// Checks a bare unit name against the characters systemd accepts.
pub fn validate_unit_name(name: &str) -> Result<(), ControlError> {
    let valid = !name.is_empty()
        && !name.ends_with(UNIT_SUFFIX)
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '.' | '@' | '-'));

    if valid {
        Ok(())
    } else {
        Err(ControlError::InvalidUnitName(name.to_string()))
    }
}

impl UnitRef {
    /// Builds a reference for `name` installed under `unit_dir`.
    pub fn new(
        name: &str,
        source_path: Option<PathBuf>,
        unit_dir: &Path,
    ) -> Result<Self, ControlError> {
        validate_unit_name(name)?;
        Ok(Self {
            name: name.to_string(),
            source_path,
            install_path: unit_dir.join(format!("{name}{UNIT_SUFFIX}")),
        })
    }

    /// Bare unit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full unit name as passed to the service manager.
    pub fn unit_name(&self) -> String {
        format!("{}{UNIT_SUFFIX}", self.name)
    }

    /// Source unit file, if the definition is file based.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Location the unit file is staged to.
    pub fn install_path(&self) -> &Path {
        &self.install_path
    }

    /// Whether a unit file is currently staged.
    pub fn is_installed(&self) -> bool {
        self.install_path.is_file()
    }

    /// Produces the unit definition bytes for `source`.
    pub fn definition(&self, source: &UnitSource) -> Result<Vec<u8>, ControlError> {
        match source {
            UnitSource::File(path) => fs::read(path).map_err(|err| {
                if err.kind() == io::ErrorKind::NotFound {
                    ControlError::UnitSourceMissing { path: path.clone() }
                } else {
                    ControlError::SourceReadError {
                        path: path.clone(),
                        source: err,
                    }
                }
            }),
            UnitSource::Template(template) => Ok(render_template(template).into_bytes()),
        }
    }

    /// Resolves the definition and compares it with what is installed,
    /// without touching the destination.
    pub fn plan(&self, source: &UnitSource) -> Result<(Vec<u8>, InstallOutcome), ControlError> {
        let definition = self.definition(source)?;
        let outcome = match fs::read(&self.install_path) {
            Ok(existing) if digest(&existing) == digest(&definition) => {
                InstallOutcome::Unchanged
            }
            Ok(_) => InstallOutcome::Updated,
            Err(err) if err.kind() == io::ErrorKind::NotFound => InstallOutcome::Installed,
            Err(source) => {
                return Err(ControlError::InstallError {
                    path: self.install_path.clone(),
                    source,
                });
            }
        };
        Ok((definition, outcome))
    }

    /// Writes the unit definition to the install path, creating the unit
    /// directory first. Rewriting identical content is skipped.
    pub fn install(&self, source: &UnitSource) -> Result<InstallOutcome, ControlError> {
        let (definition, outcome) = self.plan(source)?;
        let install_error = |source: io::Error| ControlError::InstallError {
            path: self.install_path.clone(),
            source,
        };

        if outcome != InstallOutcome::Unchanged {
            if let Some(dir) = self.install_path.parent() {
                fs::create_dir_all(dir).map_err(install_error)?;
            }
            fs::write(&self.install_path, &definition).map_err(install_error)?;
        }

        info!(
            "Unit '{}' {} at {}",
            self.name,
            outcome,
            self.install_path.display()
        );
        Ok(outcome)
    }

    /// Deletes the staged unit file. Returns `false` when nothing was installed.
    pub fn remove(&self) -> Result<bool, ControlError> {
        match fs::remove_file(&self.install_path) {
            Ok(()) => {
                debug!("Removed {}", self.install_path.display());
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(ControlError::RemoveError {
                path: self.install_path.clone(),
                source,
            }),
        }
    }
}

fn digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Renders a template into unit file syntax.
pub fn render_template(template: &UnitTemplate) -> String {
    let mut out = String::new();

    out.push_str("[Unit]\n");
    if let Some(description) = &template.description {
        let _ = writeln!(out, "Description={description}");
    }
    if !template.after.is_empty() {
        let _ = writeln!(out, "After={}", template.after.join(" "));
    }
    if !template.wants.is_empty() {
        let _ = writeln!(out, "Wants={}", template.wants.join(" "));
    }

    out.push_str("\n[Service]\nType=simple\n");
    if let Some(dir) = &template.working_directory {
        let _ = writeln!(out, "WorkingDirectory={dir}");
    }
    if let Some(file) = &template.environment_file {
        let _ = writeln!(out, "EnvironmentFile={file}");
    }
    for (key, value) in &template.environment {
        let _ = writeln!(out, "Environment=\"{key}={}\"", value.replace('"', "\\\""));
    }
    let _ = writeln!(out, "ExecStart={}", template.exec_start);
    if let Some(restart) = &template.restart {
        let _ = writeln!(out, "Restart={restart}");
    }
    if let Some(secs) = template.restart_sec {
        let _ = writeln!(out, "RestartSec={secs}");
    }

    out.push_str("\n[Install]\n");
    let wanted_by = if template.wanted_by.is_empty() {
        "default.target".to_string()
    } else {
        template.wanted_by.join(" ")
    };
    let _ = writeln!(out, "WantedBy={wanted_by}");

    out
}
