//! Core value types shared by the controller and its collaborators

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Authoritative position of the lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockState {
    /// Bolt thrown, red indicator on
    #[default]
    Locked,
    /// Bolt retracted, green indicator on
    Unlocked,
}

impl LockState {
    /// Whether this is the locked position
    pub fn is_locked(self) -> bool {
        matches!(self, LockState::Locked)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockState::Locked => write!(f, "locked"),
            LockState::Unlocked => write!(f, "unlocked"),
        }
    }
}

/// Result of an unlock attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockOutcome {
    /// Password matched; the door is open and an auto-lock is pending
    Unlocked,
    /// Password did not match; the short alert was sounded
    WrongPassword,
    /// This attempt reached the threshold and started the alarm
    AlarmTriggered,
    /// An alarm is already running; the attempt was ignored
    AlarmActive,
}

/// Identifies one scheduled auto-lock.
///
/// Generations only ever increase. A deferred re-lock acts only while its
/// generation is still the controller's active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// The generation preceding any issued token
    pub const ZERO: Generation = Generation(0);

    /// The generation after this one
    pub fn next(self) -> Generation {
        Generation(self.0 + 1)
    }

    /// Raw counter value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// A password as held by the credential store.
///
/// The backing buffer is wiped on drop. Comparison is exact equality.
#[derive(Clone)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    /// Wrap a password string
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Borrow the secret
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Check a supplied password against this credential
    pub fn matches(&self, supplied: &str) -> bool {
        self.expose() == supplied
    }

    /// Whether the credential is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_increases() {
        let g = Generation::ZERO;
        assert!(g.next() > g);
        assert_eq!(g.next().next().value(), 2);
    }

    #[test]
    fn test_credential_exact_match() {
        let c = Credential::new("2025");
        assert!(c.matches("2025"));
        assert!(!c.matches("2025 "));
        assert!(!c.matches(""));
    }

    #[test]
    fn test_credential_debug_redacted() {
        let c = Credential::new("hunter2");
        assert!(!format!("{:?}", c).contains("hunter2"));
    }

    #[test]
    fn test_lock_state_display() {
        assert_eq!(LockState::Locked.to_string(), "locked");
        assert_eq!(LockState::Unlocked.to_string(), "unlocked");
        assert_eq!(LockState::default(), LockState::Locked);
    }
}
