//! Audit log messages written by the controller

/// Boot-time assertion of the locked position
pub const SYSTEM_BOOT: &str = "SYSTEM BOOT — door locked";

/// Correct password accepted
pub const DOOR_UNLOCKED: &str = "DOOR UNLOCKED (password correct)";

/// Manual lock from the unlocked state
pub const DOOR_LOCKED: &str = "DOOR LOCKED";

/// Auto-lock timer fired for the active generation
pub const AUTO_LOCK: &str = "AUTO-LOCK ACTIVATED (timer expired)";

/// Threshold reached
pub const ALARM_TRIGGERED: &str = "ALARM TRIGGERED — too many wrong attempts";

/// Alarm finished and forced the lock
pub const ALARM_ENDED: &str = "ALARM ENDED — door locked";

/// Password change succeeded
pub const PASSWORD_CHANGED: &str = "PASSWORD CHANGED SUCCESSFULLY";

/// Password change rejected because the current password was wrong
pub const PASSWORD_CHANGE_MISMATCH: &str = "FAILED PASSWORD CHANGE (wrong current password)";

/// Password change rejected because the new password was unusable
pub const PASSWORD_CHANGE_INVALID: &str = "FAILED PASSWORD CHANGE (invalid new password)";

/// Password change failed in the store
pub const PASSWORD_CHANGE_UNAVAILABLE: &str = "FAILED PASSWORD CHANGE (credential store unavailable)";

/// Log was cleared by an administrator
pub const LOGS_CLEARED: &str = "LOGS CLEARED BY ADMIN";

/// `WRONG PASSWORD ATTEMPT (n/max)`
pub fn wrong_attempt(count: u32, max: u32) -> String {
    format!("WRONG PASSWORD ATTEMPT ({}/{})", count, max)
}

/// Actuator failure during `action`
pub fn actuator_fault(action: &str, reason: &str) -> String {
    format!("ACTUATOR FAULT during {}: {}", action, reason)
}

/// Credential store could not be read for an unlock attempt
pub fn credential_fault(reason: &str) -> String {
    format!("CREDENTIAL STORE FAULT (door kept locked): {}", reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_attempt_format() {
        assert_eq!(wrong_attempt(2, 3), "WRONG PASSWORD ATTEMPT (2/3)");
    }
}
