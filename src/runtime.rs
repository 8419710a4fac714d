//! Runtime scope and the unit directories that follow from it.
use std::{
    env,
    path::PathBuf,
    sync::{OnceLock, RwLock},
};

/// Which service manager instance units are installed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    /// Per-user manager (`systemctl --user`, ~/.config/systemd/user).
    User,
    /// System manager (`systemctl`, /etc/systemd/system).
    System,
}

impl RuntimeMode {
    /// Scope flag passed to `systemctl` and `journalctl`, if any.
    pub fn scope_flag(&self) -> Option<&'static str> {
        match self {
            RuntimeMode::User => Some("--user"),
            RuntimeMode::System => None,
        }
    }
}

#[derive(Debug, Clone)]
struct RuntimeContext {
    mode: RuntimeMode,
    unit_dir: PathBuf,
    linger_dir: PathBuf,
}

const DEFAULT_LINGER_DIR: &str = "/var/lib/systemd/linger";

static CONTEXT: OnceLock<RwLock<RuntimeContext>> = OnceLock::new();

fn context_lock() -> &'static RwLock<RuntimeContext> {
    CONTEXT.get_or_init(|| RwLock::new(RuntimeContext::from_mode(RuntimeMode::User)))
}

impl RuntimeContext {
    fn from_mode(mode: RuntimeMode) -> Self {
        match mode {
            RuntimeMode::User => Self::user_directories(),
            RuntimeMode::System => Self::system_directories(),
        }
    }

    fn user_directories() -> Self {
        let config_home = env::var_os("XDG_CONFIG_HOME")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/"))
                    .join(".config")
            });

        Self {
            mode: RuntimeMode::User,
            unit_dir: config_home.join("systemd/user"),
            linger_dir: PathBuf::from(DEFAULT_LINGER_DIR),
        }
    }

    fn system_directories() -> Self {
        Self {
            mode: RuntimeMode::System,
            unit_dir: PathBuf::from("/etc/systemd/system"),
            linger_dir: PathBuf::from(DEFAULT_LINGER_DIR),
        }
    }
}

/// Sets runtime mode, recomputing directories from the current environment.
pub fn init(mode: RuntimeMode) {
    let mut guard = context_lock().write().expect("runtime context poisoned");
    *guard = RuntimeContext::from_mode(mode);
}

/// Returns the current runtime mode (User or System).
pub fn mode() -> RuntimeMode {
    context_lock()
        .read()
        .expect("runtime context poisoned")
        .mode
}

/// Directory the service manager loads unit files from.
pub fn unit_dir() -> PathBuf {
    context_lock()
        .read()
        .expect("runtime context poisoned")
        .unit_dir
        .clone()
}

/// Directory where logind records lingering users.
pub fn linger_dir() -> PathBuf {
    context_lock()
        .read()
        .expect("runtime context poisoned")
        .linger_dir
        .clone()
}
