//! Rolling-window comment ledger
//!
//! Rate-limits how many comments the bot posts per rolling day. The ledger
//! is a JSON array of records; expiry is whole-file: once the oldest record
//! passes the 24-hour window the file is deleted and the count starts over.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::info;

use common::Result;

use crate::cookies::write_atomic;

/// Rolling window after which the ledger expires wholesale.
pub const ROLLING_WINDOW_MS: u64 = 24 * 60 * 60 * 1000;

/// One posted comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub content: String,
    /// Unix timestamp in milliseconds
    pub posted_at_ms: u64,
}

/// File-backed ledger capping comments per rolling window.
pub struct ActionLedger {
    path: PathBuf,
    limit: usize,
}

impl ActionLedger {
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit,
        }
    }

    async fn load(&self) -> Result<Vec<ActionRecord>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&contents).map_err(|e| common::Error::Json(e.to_string()))
    }

    /// Delete the ledger when its oldest record has left the window.
    pub async fn prune_expired(&self, now_ms: u64) -> Result<()> {
        let records = self.load().await?;
        let Some(oldest) = records.first() else {
            return Ok(());
        };
        if now_ms.saturating_sub(oldest.posted_at_ms) > ROLLING_WINDOW_MS {
            tokio::fs::remove_file(&self.path).await?;
            info!(path = %self.path.display(), "action ledger expired and was reset");
        }
        Ok(())
    }

    /// Whether another comment may be posted in the current window.
    pub async fn can_post(&self) -> Result<bool> {
        Ok(self.load().await?.len() < self.limit)
    }

    /// Append a record for a posted comment.
    pub async fn record(&self, content: &str, now_ms: u64) -> Result<()> {
        let mut records = self.load().await?;
        records.push(ActionRecord {
            content: content.to_string(),
            posted_at_ms: now_ms,
        });
        let contents = serde_json::to_string_pretty(&records)
            .map_err(|e| common::Error::Json(e.to_string()))?;
        write_atomic(&self.path, &contents).await
    }
}

/// Current unix time in milliseconds.
pub fn unix_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Current unix time in seconds.
pub fn unix_time_secs() -> u64 {
    unix_time_ms() / 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(dir: &tempfile::TempDir, limit: usize) -> ActionLedger {
        ActionLedger::new(dir.path().join("data/actions.json"), limit)
    }

    #[tokio::test]
    async fn empty_ledger_allows_posting() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ledger(&dir, 17).can_post().await.unwrap());
    }

    #[tokio::test]
    async fn record_counts_toward_the_limit() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&dir, 2);

        ledger.record("first", 1_000).await.unwrap();
        assert!(ledger.can_post().await.unwrap());

        ledger.record("second", 2_000).await.unwrap();
        assert!(!ledger.can_post().await.unwrap());
    }

    #[tokio::test]
    async fn prune_keeps_records_inside_the_window() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&dir, 17);

        ledger.record("recent", 1_000_000).await.unwrap();
        ledger
            .prune_expired(1_000_000 + ROLLING_WINDOW_MS / 2)
            .await
            .unwrap();

        assert_eq!(ledger.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn prune_deletes_file_once_oldest_record_ages_out() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&dir, 1);

        ledger.record("old", 1_000).await.unwrap();
        assert!(!ledger.can_post().await.unwrap());

        ledger
            .prune_expired(1_000 + ROLLING_WINDOW_MS + 1)
            .await
            .unwrap();

        // File gone, count reset
        assert!(ledger.can_post().await.unwrap());
    }

    #[tokio::test]
    async fn prune_on_missing_file_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        ledger(&dir, 17).prune_expired(5_000).await.unwrap();
    }
}
