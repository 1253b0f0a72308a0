//! Password change, kept beside the locking core
//!
//! Changing the password never touches the controller lock. The controller
//! re-reads the store on every attempt, so a change is effective for the
//! next attempt that reads after it commits.

use tracing::{info, warn};

use crate::collaborators::{CredentialStore, EventLog};
use crate::error::CredentialError;
use crate::events;

/// Longest accepted password
pub const MAX_PASSWORD_LENGTH: usize = 64;

/// Reject passwords that could not round-trip through a line-oriented store
pub fn validate_password(password: &str) -> Result<(), CredentialError> {
    if password.is_empty() {
        return Err(CredentialError::Invalid("password must not be empty".to_string()));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(CredentialError::Invalid(format!(
            "password must be at most {} bytes",
            MAX_PASSWORD_LENGTH
        )));
    }
    if password.trim() != password || password.chars().any(char::is_control) {
        return Err(CredentialError::Invalid(
            "password must not contain control characters or surrounding whitespace".to_string(),
        ));
    }
    Ok(())
}

/// Replace the password if `old` is the current one, recording the outcome
pub async fn change_password(
    store: &dyn CredentialStore,
    log: &dyn EventLog,
    old: &str,
    new: &str,
) -> Result<(), CredentialError> {
    if let Err(e) = validate_password(new) {
        warn!("Password change rejected: {}", e);
        log.append(events::PASSWORD_CHANGE_INVALID).await;
        return Err(e);
    }

    match store.replace(old, new).await {
        Ok(()) => {
            info!("Password changed");
            log.append(events::PASSWORD_CHANGED).await;
            Ok(())
        }
        Err(CredentialError::Mismatch) => {
            warn!("Password change with wrong current password");
            log.append(events::PASSWORD_CHANGE_MISMATCH).await;
            Err(CredentialError::Mismatch)
        }
        Err(e) => {
            warn!("Password change failed: {}", e);
            log.append(events::PASSWORD_CHANGE_UNAVAILABLE).await;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MemoryCredentialStore, MemoryEventLog};

    #[tokio::test]
    async fn test_change_password_success() {
        let store = MemoryCredentialStore::new("2025");
        let log = MemoryEventLog::new();

        change_password(&store, &log, "2025", "7351").await.unwrap();
        assert_eq!(store.current(), "7351");
        assert_eq!(log.entries(), vec![events::PASSWORD_CHANGED.to_string()]);
    }

    #[tokio::test]
    async fn test_change_password_wrong_current() {
        let store = MemoryCredentialStore::new("2025");
        let log = MemoryEventLog::new();

        let err = change_password(&store, &log, "1111", "7351").await.unwrap_err();
        assert_eq!(err, CredentialError::Mismatch);
        assert_eq!(store.current(), "2025");
        assert_eq!(log.count(events::PASSWORD_CHANGE_MISMATCH), 1);
    }

    #[tokio::test]
    async fn test_change_password_rejects_blank() {
        let store = MemoryCredentialStore::new("2025");
        let log = MemoryEventLog::new();

        let err = change_password(&store, &log, "2025", "  ").await.unwrap_err();
        assert!(matches!(err, CredentialError::Invalid(_)));
        assert_eq!(store.current(), "2025");
    }

    #[tokio::test]
    async fn test_change_password_store_offline() {
        let store = MemoryCredentialStore::new("2025");
        store.set_unavailable(true);
        let log = MemoryEventLog::new();

        let err = change_password(&store, &log, "2025", "7351").await.unwrap_err();
        assert!(matches!(err, CredentialError::Unavailable(_)));
        assert_eq!(log.count(events::PASSWORD_CHANGE_UNAVAILABLE), 1);
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("2025").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password(" 2025").is_err());
        assert!(validate_password("20\n25").is_err());
        assert!(validate_password(&"9".repeat(65)).is_err());
    }
}
