//! Structured unit status built from `systemctl show`.
use serde::Serialize;

use crate::error::ControlError;

/// Machine-readable snapshot of a unit's state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnitStatus {
    pub id: String,
    pub load_state: Option<String>,
    pub active_state: Option<String>,
    pub sub_state: Option<String>,
    /// `None` when the unit has no main process.
    pub main_pid: Option<u32>,
    pub unit_file_state: Option<String>,
    /// Whether logind keeps the owning user's manager alive without a session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linger: Option<bool>,
}

impl UnitStatus {
    /// True when the manager reports the unit as active.
    pub fn is_active(&self) -> bool {
        self.active_state.as_deref() == Some("active")
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parses `Key=Value` lines; unknown keys are ignored.
pub fn parse_show_output(unit: &str, output: &str) -> Result<UnitStatus, ControlError> {
    let mut status = UnitStatus {
        id: unit.to_string(),
        ..UnitStatus::default()
    };

    for line in output.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let Some((key, value)) = line.split_once('=') else {
            return Err(ControlError::StatusParseError {
                unit: unit.to_string(),
                reason: format!("malformed line '{line}'"),
            });
        };

        match key {
            "Id" if !value.is_empty() => status.id = value.to_string(),
            "LoadState" => status.load_state = non_empty(value),
            "ActiveState" => status.active_state = non_empty(value),
            "SubState" => status.sub_state = non_empty(value),
            "UnitFileState" => status.unit_file_state = non_empty(value),
            "MainPID" => {
                let pid = value.parse::<u32>().map_err(|err| {
                    ControlError::StatusParseError {
                        unit: unit.to_string(),
                        reason: format!("MainPID '{value}': {err}"),
                    }
                })?;
                status.main_pid = (pid != 0).then_some(pid);
            }
            _ => {}
        }
    }

    Ok(status)
}
