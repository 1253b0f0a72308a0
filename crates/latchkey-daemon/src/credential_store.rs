//! File-backed password store
//!
//! The password is kept as a single line in a file readable only by the
//! daemon user. Replacement is serialized and written atomically
//! (temp file + rename), so a concurrent unlock attempt sees either the old
//! or the new password, never a partial one.

use async_trait::async_trait;
use latchkey_core::{Credential, CredentialError, CredentialStore};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::Result;

/// Password stored in a plain file
pub struct FileCredentialStore {
    path: PathBuf,
    /// Serializes read-compare-write in `replace`
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Store backed by `path`
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the password file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `default` if no password file exists yet
    pub async fn ensure_seeded(&self, default: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if tokio::fs::try_exists(&self.path).await? {
            debug!("Password file present at {:?}", self.path);
            return Ok(());
        }

        write_atomic(&self.path, default).await?;
        info!("Seeded default password at {:?}", self.path);
        Ok(())
    }

    async fn read_current(&self) -> std::result::Result<String, CredentialError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map(|contents| contents.trim().to_string())
            .map_err(|e| CredentialError::Unavailable(format!("{:?}: {}", self.path, e)))
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn read(&self) -> std::result::Result<Credential, CredentialError> {
        let password = self.read_current().await?;
        if password.is_empty() {
            return Err(CredentialError::Unavailable(format!(
                "{:?} is empty",
                self.path
            )));
        }
        Ok(Credential::new(password))
    }

    async fn replace(&self, old: &str, new: &str) -> std::result::Result<(), CredentialError> {
        let _guard = self.write_lock.lock().await;

        let current = Credential::new(self.read_current().await?);
        if !current.matches(old) {
            return Err(CredentialError::Mismatch);
        }

        write_atomic(&self.path, new)
            .await
            .map_err(|e| CredentialError::Unavailable(e.to_string()))
    }
}

/// Write via a temp file and rename, with owner-only permissions
async fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, contents).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600)).await?;
    }

    tokio::fs::rename(&temp_path, path).await
}
