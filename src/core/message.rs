//! Message log
//!
//! Append-only sequence of chat messages with strictly increasing ids.
//! Only a contiguous prefix is ever removed, so the deque stays sorted
//! and id lookups can binary search.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Message identifier. Ids start at 0 and never repeat.
pub type MessageId = i64;

/// Sentinel id reported when the log holds no messages
pub const NO_MESSAGE: MessageId = -1;

/// A single chat message. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from: String,
    pub text: String,
}

/// Ordered message log (oldest first)
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: VecDeque<Message>,
}

impl MessageLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self {
            messages: VecDeque::with_capacity(1024),
        }
    }

    /// Rebuild a log from persisted messages.
    ///
    /// Entries that would break id ordering are dropped, as is an id with no
    /// successor (`MessageId::MAX`).
    pub fn from_messages(messages: Vec<Message>) -> Self {
        let mut log = Self::new();
        for message in messages {
            if message.id > log.last_id() && message.id < MessageId::MAX {
                log.messages.push_back(message);
            } else {
                tracing::warn!(target: "relay", id = message.id, "Dropping invalid or out-of-order message");
            }
        }
        log
    }

    /// Append a message, assigning the next id
    pub fn append(&mut self, from: impl Into<String>, text: impl Into<String>) -> Message {
        let message = Message {
            id: self.last_id() + 1,
            from: from.into(),
            text: text.into(),
        };
        crate::log_relay!(tracing::Level::INFO, "{}: {}", message.from, message.text);
        self.messages.push_back(message.clone());
        message
    }

    /// Id of the most recent message, or [`NO_MESSAGE`] when empty
    #[inline]
    pub fn last_id(&self) -> MessageId {
        self.messages.back().map_or(NO_MESSAGE, |m| m.id)
    }

    /// Position of the message with the given id
    #[inline]
    pub fn position(&self, id: MessageId) -> Option<usize> {
        self.messages.binary_search_by_key(&id, |m| m.id).ok()
    }

    /// Remove every message before the one with `id`.
    ///
    /// No-op when `id` is not present. Returns the number removed.
    pub fn prune_before(&mut self, id: MessageId) -> usize {
        match self.position(id) {
            Some(pos) => {
                self.messages.drain(..pos);
                pos
            }
            None => 0,
        }
    }

    /// Messages with id strictly greater than `id`
    pub fn slice_after(&self, id: MessageId) -> Vec<Message> {
        self.slice_range(id, MessageId::MAX)
    }

    /// Messages with `start_exclusive < id <= end_inclusive`
    pub fn slice_range(&self, start_exclusive: MessageId, end_inclusive: MessageId) -> Vec<Message> {
        let start = self.messages.partition_point(|m| m.id <= start_exclusive);
        let end = self.messages.partition_point(|m| m.id <= end_inclusive);
        if start >= end {
            return Vec::new();
        }
        self.messages.range(start..end).cloned().collect()
    }

    /// Every message currently retained
    pub fn all(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    pub fn first_id(&self) -> Option<MessageId> {
        self.messages.front().map(|m| m.id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with(n: usize) -> MessageLog {
        let mut log = MessageLog::new();
        for i in 0..n {
            log.append("alice", format!("msg {}", i));
        }
        log
    }

    #[test]
    fn test_empty_log() {
        let log = MessageLog::new();
        assert!(log.is_empty());
        assert_eq!(log.last_id(), NO_MESSAGE);
        assert_eq!(log.first_id(), None);
        assert!(log.slice_after(NO_MESSAGE).is_empty());
    }

    #[test]
    fn test_ids_start_at_zero_and_increase() {
        let log = log_with(50);
        let ids: Vec<MessageId> = log.all().iter().map(|m| m.id).collect();
        assert_eq!(ids, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_ids_continue_after_prune() {
        let mut log = log_with(10);
        assert_eq!(log.prune_before(9), 9);
        let msg = log.append("bob", "after prune");
        assert_eq!(msg.id, 10);
        assert_eq!(log.first_id(), Some(9));
    }

    #[test]
    fn test_prune_before_missing_id_is_noop() {
        let mut log = log_with(5);
        assert_eq!(log.prune_before(42), 0);
        assert_eq!(log.prune_before(NO_MESSAGE), 0);
        assert_eq!(log.len(), 5);

        log.prune_before(3);
        // 1 is gone now, pruning to it again changes nothing
        assert_eq!(log.prune_before(1), 0);
        assert_eq!(log.first_id(), Some(3));
    }

    #[test]
    fn test_prune_keeps_target_message() {
        let mut log = log_with(5);
        log.prune_before(2);
        let ids: Vec<MessageId> = log.all().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_slice_range_bounds() {
        let log = log_with(6);
        let ids: Vec<MessageId> = log.slice_range(1, 4).iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert!(log.slice_range(4, 4).is_empty());
        assert!(log.slice_range(5, 2).is_empty());

        let ids: Vec<MessageId> = log.slice_after(3).iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![4, 5]);
    }

    #[test]
    fn test_from_messages_drops_unordered() {
        let raw = vec![
            Message { id: 3, from: "a".into(), text: "x".into() },
            Message { id: 2, from: "a".into(), text: "y".into() },
            Message { id: 7, from: "a".into(), text: "z".into() },
        ];
        let mut log = MessageLog::from_messages(raw);
        assert_eq!(log.len(), 2);
        assert_eq!(log.last_id(), 7);
        assert_eq!(log.append("b", "next").id, 8);
    }

    #[test]
    fn test_from_messages_drops_id_without_successor() {
        let raw = vec![
            Message { id: 10, from: "a".into(), text: "ok".into() },
            Message { id: MessageId::MAX, from: "a".into(), text: "corrupt".into() },
        ];
        let mut log = MessageLog::from_messages(raw);
        assert_eq!(log.last_id(), 10);
        assert_eq!(log.append("b", "next").id, 11);
    }
}
