//! Identity and privilege helpers.
use nix::unistd::{Uid, User};

use crate::error::ControlError;

/// Returns whether the effective user is root.
pub fn is_root() -> bool {
    Uid::effective().is_root()
}

/// Fails unless running as root; `what` names the feature that needs it.
pub fn require_root(what: &str) -> Result<(), ControlError> {
    if is_root() {
        Ok(())
    } else {
        Err(ControlError::PrivilegeRequired(what.to_string()))
    }
}

/// Login name of the effective user, resolved through the passwd database.
pub fn current_username() -> Result<String, ControlError> {
    let uid = Uid::effective();
    User::from_uid(uid)?
        .map(|user| user.name)
        .ok_or_else(|| ControlError::UnknownUser(uid.to_string()))
}

/// Confirms that `name` exists in the passwd database.
pub fn ensure_user_exists(name: &str) -> Result<(), ControlError> {
    match User::from_name(name)? {
        Some(_) => Ok(()),
        None => Err(ControlError::UnknownUser(name.to_string())),
    }
}
