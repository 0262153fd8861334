//! Retention policy
//!
//! Bounds the message log: lagging cursors are clamped to the tail, then
//! everything below the lowest remaining cursor is dropped.

use crate::core::{ClientRegistry, MessageId, MessageLog};

/// Default clamp distance in messages
pub const DEFAULT_MAX_MESSAGE_OFFSET: i64 = 300;

/// Outcome of one retention pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionReport {
    /// Clients whose cursor was forced to the tail
    pub clamped: Vec<String>,
    /// Retention floor used for pruning
    pub floor: Option<MessageId>,
    /// Number of messages removed from the log
    pub pruned: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    max_offset: i64,
}

impl RetentionPolicy {
    pub fn new(max_offset: i64) -> Self {
        Self { max_offset }
    }

    pub fn max_offset(&self) -> i64 {
        self.max_offset
    }

    /// Clamp, compute the floor, prune.
    ///
    /// Nothing happens without registered clients. A client that lags by
    /// more than `max_offset` silently loses the skipped messages.
    pub fn apply(&self, clients: &mut ClientRegistry, log: &mut MessageLog) -> RetentionReport {
        if clients.is_empty() {
            return RetentionReport::default();
        }

        let tail = log.last_id();
        let clamped = clients.clamp(tail, self.max_offset);
        for name in &clamped {
            tracing::debug!(target: "relay", client = %name, tail, "Cursor clamped");
        }

        let floor = clients.min_cursor();
        let pruned = floor.map_or(0, |id| log.prune_before(id));

        RetentionReport {
            clamped,
            floor,
            pruned,
        }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE_OFFSET)
    }
}
