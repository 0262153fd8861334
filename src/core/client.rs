//! Client registry
//!
//! Maps client names to their read cursor. Records survive disconnects so a
//! returning client resumes where it left off (or gets a full replay once its
//! cursor has been pruned away).

use crate::core::message::{Message, MessageId, MessageLog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted client record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    /// Last delivered message id
    #[serde(rename = "lm")]
    pub last_message_id: MessageId,
    pub name: String,
}

/// Name -> cursor mapping
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    cursors: BTreeMap<String, MessageId>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted records. Later duplicates win.
    pub fn from_records(records: Vec<ClientRecord>) -> Self {
        let cursors = records
            .into_iter()
            .map(|r| (r.name, r.last_message_id))
            .collect();
        Self { cursors }
    }

    /// Get the client's cursor, creating the client at the log tail if absent.
    ///
    /// New clients never see history from before they joined.
    pub fn get_or_create(&mut self, name: &str, log: &MessageLog) -> ClientRecord {
        let cursor = *self.cursors.entry(name.to_string()).or_insert_with(|| {
            crate::log_relay!(tracing::Level::INFO, "Created client '{}'.", name);
            log.last_id()
        });
        ClientRecord {
            last_message_id: cursor,
            name: name.to_string(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cursors.contains_key(name)
    }

    pub fn cursor(&self, name: &str) -> Option<MessageId> {
        self.cursors.get(name).copied()
    }

    /// Deliver pending messages and move the cursor to the log tail.
    ///
    /// If the cursor is still in the log, returns messages strictly between
    /// the old cursor and the current tail; the tail itself is not included.
    /// If the cursor was pruned (or never existed) the whole log is returned.
    /// The cursor ends at the tail either way. Unknown names get nothing.
    pub fn resolve_and_advance(&mut self, name: &str, log: &MessageLog) -> Vec<Message> {
        let Some(cursor) = self.cursors.get_mut(name) else {
            return Vec::new();
        };
        let old = *cursor;
        let tail = log.last_id();
        *cursor = tail;

        match log.position(old) {
            Some(_) => log.slice_range(old, tail - 1),
            None => log.all(),
        }
    }

    /// Advance every cursor lagging more than `max_offset` behind `tail`.
    /// Returns the names that were clamped.
    pub fn clamp(&mut self, tail: MessageId, max_offset: i64) -> Vec<String> {
        let mut clamped = Vec::new();
        for (name, cursor) in self.cursors.iter_mut() {
            if tail.saturating_sub(*cursor) > max_offset {
                *cursor = tail;
                clamped.push(name.clone());
            }
        }
        clamped
    }

    /// Lowest cursor across all clients (the retention floor)
    pub fn min_cursor(&self) -> Option<MessageId> {
        self.cursors.values().copied().min()
    }

    pub fn records(&self) -> Vec<ClientRecord> {
        self.cursors
            .iter()
            .map(|(name, &cursor)| ClientRecord {
                last_message_id: cursor,
                name: name.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}
