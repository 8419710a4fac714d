//! Configuration management for tradectl.
use regex::Regex;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};

use crate::error::ConfigError;

/// Config file looked up in the working directory when `--config` is omitted.
pub const DEFAULT_CONFIG_FILE: &str = "tradectl.yaml";

/// Unit managed when the config does not name one.
pub const DEFAULT_UNIT_NAME: &str = "tradecopy";

/// Represents the structure of the configuration file.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// The unit being installed and driven.
    pub unit: UnitConfig,
    /// Overrides the scope's default unit directory.
    pub install_dir: Option<String>,
    /// Session-independent persistence settings.
    pub linger: LingerConfig,
    /// External programs invoked by the sequencer.
    pub tools: ToolsConfig,
    /// Root directory from which relative paths are resolved.
    #[serde(skip)]
    pub project_dir: Option<String>,
}

/// Identity and definition of the managed unit.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UnitConfig {
    /// Unit name without the `.service` suffix.
    pub name: String,
    /// Path to a hand-written unit file.
    pub source: Option<String>,
    /// Declarative unit definition rendered when no source file is given.
    pub template: Option<UnitTemplate>,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_UNIT_NAME.to_string(),
            source: None,
            template: None,
        }
    }
}

/// Declarative `[Unit]`/`[Service]`/`[Install]` fields for a simple service.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct UnitTemplate {
    pub description: Option<String>,
    pub exec_start: String,
    pub working_directory: Option<String>,
    pub environment_file: Option<String>,
    pub environment: BTreeMap<String, String>,
    pub restart: Option<String>,
    pub restart_sec: Option<u64>,
    pub after: Vec<String>,
    pub wants: Vec<String>,
    pub wanted_by: Vec<String>,
}

/// Linger (user manager outlives login sessions) settings.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LingerConfig {
    /// Whether `deploy` should enable lingering.
    pub enabled: bool,
    /// Account to enable lingering for; defaults to the invoking user.
    pub user: Option<String>,
    /// Where logind records lingering users.
    pub state_dir: Option<String>,
}

/// Programs used to talk to the service manager.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ToolsConfig {
    pub systemctl: String,
    pub journalctl: String,
    pub loginctl: String,
    /// Prefix for privileged commands; empty disables escalation.
    pub escalate: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            systemctl: "systemctl".into(),
            journalctl: "journalctl".into(),
            loginctl: "loginctl".into(),
            escalate: "sudo".into(),
        }
    }
}

impl ToolsConfig {
    /// Escalation program and its leading arguments, if one is configured.
    /// `"sudo -n"` yields `("sudo", ["-n"])`.
    pub fn escalation(&self) -> Option<(&str, Vec<&str>)> {
        let mut words = self.escalate.split_whitespace();
        let program = words.next()?;
        Some((program, words.collect()))
    }
}

/// Where the unit definition comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitSource {
    /// Copy an existing unit file.
    File(PathBuf),
    /// Render the configured template.
    Template(UnitTemplate),
}

impl Config {
    /// Directory relative paths are resolved against.
    pub fn base_dir(&self) -> PathBuf {
        PathBuf::from(self.project_dir.as_deref().unwrap_or("."))
    }

    /// Resolves a configured path against the config file's directory.
    pub fn resolve_path(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir().join(path)
        }
    }

    /// Picks the unit definition: explicit file, then template, then `<name>.service`.
    pub fn unit_source(&self) -> UnitSource {
        match (&self.unit.source, &self.unit.template) {
            (Some(source), _) => UnitSource::File(self.resolve_path(source)),
            (None, Some(template)) => UnitSource::Template(template.clone()),
            (None, None) => UnitSource::File(
                self.resolve_path(&format!("{}.service", self.unit.name)),
            ),
        }
    }

    /// Configured unit directory override, resolved.
    pub fn install_dir(&self) -> Option<PathBuf> {
        self.install_dir.as_deref().map(|dir| self.resolve_path(dir))
    }

    /// Configured linger state directory override, resolved.
    pub fn linger_dir(&self) -> Option<PathBuf> {
        self.linger
            .state_dir
            .as_deref()
            .map(|dir| self.resolve_path(dir))
    }
}

/// Expands `${VAR}` references from the process environment.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex");

    if let Some(missing) = re
        .captures_iter(input)
        .map(|caps| caps[1].to_string())
        .find(|name| env::var(name).is_err())
    {
        return Err(ConfigError::MissingEnvVar(missing));
    }

    let result = re.replace_all(input, |caps: &regex::Captures| {
        env::var(&caps[1]).unwrap_or_default()
    });
    Ok(result.to_string())
}

/// Loads and parses the configuration file, expanding environment variables.
///
/// Without an explicit path, `tradectl.yaml` in the working directory is used
/// when present and built-in defaults otherwise.
pub fn load_config(config_path: Option<&str>) -> Result<Config, ConfigError> {
    let config_path = match config_path {
        Some(path) => Path::new(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return Ok(Config {
                    project_dir: Some(".".into()),
                    ..Config::default()
                });
            }
            default
        }
    };

    let content = fs::read_to_string(config_path).map_err(|e| {
        ConfigError::ReadError(std::io::Error::new(
            e.kind(),
            format!("{} ({})", e, config_path.display()),
        ))
    })?;

    let expanded_content = expand_env_vars(&content)?;
    let mut config: Config = if expanded_content.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(&expanded_content)?
    };

    let base_path = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    config.project_dir = Some(base_path.to_string_lossy().to_string());
    Ok(config)
}
