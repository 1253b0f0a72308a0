//! Timestamped audit log on disk
//!
//! Each entry is one line, `[YYYY-MM-DD HH:MM:SS] message`, in local time.
//! Append failures are reported through tracing and otherwise ignored.

use async_trait::async_trait;
use latchkey_core::{events, EventLog};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::Result;

/// Append-only log file
pub struct FileEventLog {
    path: PathBuf,
    /// Keeps appends and truncation from interleaving
    lock: Mutex<()>,
}

impl FileEventLog {
    /// Log backed by `path`
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, oldest first. A missing file reads as empty.
    pub async fn entries(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock().await;
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(contents.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// The newest `n` entries, oldest first
    pub async fn tail(&self, n: usize) -> Result<Vec<String>> {
        let mut entries = self.entries().await?;
        let skip = entries.len().saturating_sub(n);
        Ok(entries.split_off(skip))
    }

    /// Truncate the log and record that it was cleared.
    ///
    /// The clear record is written under the same lock, so it is always the
    /// first entry of the new log.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, b"").await?;
        self.write_line(&format_entry(chrono::Local::now(), events::LOGS_CLEARED))
            .await?;
        Ok(())
    }

    async fn write_line(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

/// Format one log line
pub fn format_entry(timestamp: chrono::DateTime<chrono::Local>, message: &str) -> String {
    format!("[{}] {}\n", timestamp.format("%Y-%m-%d %H:%M:%S"), message)
}

#[async_trait]
impl EventLog for FileEventLog {
    async fn append(&self, message: &str) {
        let line = format_entry(chrono::Local::now(), message);
        let _guard = self.lock.lock().await;
        if let Err(e) = self.write_line(&line).await {
            warn!("Failed to write event log {:?}: {}", self.path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_format_entry() {
        let ts = chrono::Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            format_entry(ts, "DOOR LOCKED"),
            "[2025-01-02 03:04:05] DOOR LOCKED\n"
        );
    }

    #[tokio::test]
    async fn test_append_in_order() {
        let dir = tempdir().unwrap();
        let log = FileEventLog::new(dir.path().join("logs").join("events.log"));

        log.append("first").await;
        log.append("second").await;

        let entries = log.entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].ends_with("] first"));
        assert!(entries[1].ends_with("] second"));
    }

    #[tokio::test]
    async fn test_missing_log_reads_empty() {
        let dir = tempdir().unwrap();
        let log = FileEventLog::new(dir.path().join("events.log"));
        assert!(log.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_records_itself() {
        let dir = tempdir().unwrap();
        let log = FileEventLog::new(dir.path().join("events.log"));
        log.append("old entry").await;

        log.clear().await.unwrap();

        let entries = log.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].ends_with(events::LOGS_CLEARED));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_clear_record_comes_first_under_concurrent_appends() {
        let dir = tempdir().unwrap();
        let log = std::sync::Arc::new(FileEventLog::new(dir.path().join("events.log")));
        log.append("before").await;

        let writers: Vec<_> = (0..20)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move { log.append(&format!("entry {}", i)).await })
            })
            .collect();
        log.clear().await.unwrap();
        for writer in writers {
            writer.await.unwrap();
        }

        let entries = log.entries().await.unwrap();
        let cleared = entries
            .iter()
            .position(|e| e.ends_with(events::LOGS_CLEARED))
            .unwrap();
        assert_eq!(cleared, 0);
    }

    #[tokio::test]
    async fn test_tail() {
        let dir = tempdir().unwrap();
        let log = FileEventLog::new(dir.path().join("events.log"));
        for i in 0..5 {
            log.append(&format!("entry {}", i)).await;
        }

        let tail = log.tail(2).await.unwrap();
        assert_eq!(tail.len(), 2);
        assert!(tail[0].ends_with("entry 3"));
        assert!(tail[1].ends_with("entry 4"));
        assert_eq!(log.tail(10).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_unwritable_path_is_ignored() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let log = FileEventLog::new(blocker.join("events.log"));
        // Must not panic or surface an error
        log.append("lost").await;
    }
}
