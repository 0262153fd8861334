//! Snapshot persistence
//!
//! The relay state is written as one JSON document with two top-level
//! fields, `clients` and `messages`. Either may be missing on load.
//! Failures are logged and never stop the relay.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::{ClientRecord, Message};
use crate::Result;

/// On-disk snapshot layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<ClientRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
}

impl Snapshot {
    pub fn new(clients: Vec<ClientRecord>, messages: Vec<Message>) -> Self {
        Self {
            clients: Some(clients),
            messages: Some(messages),
        }
    }
}

/// File-backed snapshot store
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the snapshot file
    pub async fn read(&self) -> Result<Snapshot> {
        let data = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Load the snapshot, logging each outcome.
    ///
    /// Returns `None` if the file cannot be read or decoded; the caller starts
    /// empty and should write a fresh snapshot.
    pub async fn load(&self) -> Option<Snapshot> {
        let snapshot = match self.read().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(target: "storage", path = %self.path.display(), "Could not load database: {}", e);
                return None;
            }
        };

        if snapshot.clients.is_some() {
            tracing::info!(target: "storage", "Client data loaded.");
        } else {
            tracing::warn!(target: "storage", "Client data not found.");
        }
        if snapshot.messages.is_some() {
            tracing::info!(target: "storage", "Messages data loaded.");
        } else {
            tracing::warn!(target: "storage", "Messages data not found.");
        }
        Some(snapshot)
    }

    /// Write the full snapshot
    pub async fn write(&self, snapshot: &Snapshot) -> Result<()> {
        let data = serde_json::to_vec(snapshot)?;
        tokio::fs::write(&self.path, data).await?;
        Ok(())
    }

    /// Write the snapshot, logging instead of returning failures.
    /// Returns whether the write succeeded.
    pub async fn save(&self, snapshot: &Snapshot) -> bool {
        match self.write(snapshot).await {
            Ok(()) => {
                tracing::debug!(target: "storage", "Successfully updated the database.");
                true
            }
            Err(e) => {
                tracing::error!(target: "storage", path = %self.path.display(), "Could not update the database: {}. Data will NOT be saved.", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        Snapshot::new(
            vec![ClientRecord { last_message_id: 1, name: "alice".into() }],
            vec![
                Message { id: 0, from: "Server".into(), text: "alice has joined the chat.".into() },
                Message { id: 1, from: "alice".into(), text: "hi".into() },
            ],
        )
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("db.json"));

        assert!(tokio_test::block_on(store.save(&sample())));
        let loaded = tokio_test::block_on(store.load()).unwrap();
        assert_eq!(loaded, sample());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nope.json"));
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(SnapshotStore::new(path).load().await.is_none());
    }

    #[tokio::test]
    async fn test_fields_load_independently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, br#"{"messages":[{"id":4,"from":"a","text":"b"}]}"#).unwrap();

        let loaded = SnapshotStore::new(path).load().await.unwrap();
        assert!(loaded.clients.is_none());
        assert_eq!(loaded.messages.unwrap()[0].id, 4);
    }

    #[tokio::test]
    async fn test_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("missing").join("db.json"));
        assert!(!store.save(&sample()).await);
    }

    #[test]
    fn test_layout() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["clients"][0]["lm"], 1);
        assert_eq!(json["messages"][1]["from"], "alice");
    }
}
