//! Inactivity reaper
//!
//! Evicts every connection idle beyond the timeout and posts a system
//! notice for each one.

use crate::core::{ConnectionTracker, MessageLog, Millis};

/// Default idle timeout in milliseconds
pub const DEFAULT_INACTIVITY_TIMEOUT_MS: u64 = 20_000;

/// Sender name used for timeout notices
pub const SYSTEM_SENDER: &str = "System";

#[derive(Debug, Clone, Copy)]
pub struct InactivityReaper {
    timeout_ms: u64,
}

impl InactivityReaper {
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Evict idle connections as of `now`. Returns the evicted names.
    pub fn reap(
        &self,
        connections: &mut ConnectionTracker,
        log: &mut MessageLog,
        now: Millis,
    ) -> Vec<String> {
        if connections.is_empty() {
            return Vec::new();
        }

        let expired = connections.expired(now, self.timeout_ms);
        for name in &expired {
            connections.remove(name);
            log.append(SYSTEM_SENDER, format!("{} has disconnected (timed out).", name));
        }
        expired
    }
}

impl Default for InactivityReaper {
    fn default() -> Self {
        Self::new(DEFAULT_INACTIVITY_TIMEOUT_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_only_idle() {
        let mut connections = ConnectionTracker::new();
        let mut log = MessageLog::new();
        connections.touch("idle", 0);
        connections.touch("active", 20_000);

        let evicted = InactivityReaper::default().reap(&mut connections, &mut log, 25_000);

        assert_eq!(evicted, vec!["idle".to_string()]);
        assert!(!connections.is_active("idle"));
        assert!(connections.is_active("active"));
        assert_eq!(log.len(), 1);
        let notice = &log.all()[0];
        assert_eq!(notice.from, "System");
        assert_eq!(notice.text, "idle has disconnected (timed out).");
    }

    #[test]
    fn test_timeout_boundary_is_kept() {
        let mut connections = ConnectionTracker::new();
        let mut log = MessageLog::new();
        connections.touch("edge", 5_000);

        let evicted = InactivityReaper::default().reap(&mut connections, &mut log, 25_000);
        assert!(evicted.is_empty());
        assert!(connections.is_active("edge"));
        assert!(log.is_empty());
    }

    #[test]
    fn test_evicts_all_expired() {
        let mut connections = ConnectionTracker::new();
        let mut log = MessageLog::new();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            connections.touch(name, i as u64 * 1_000);
        }
        connections.touch("d", 60_000);

        let evicted = InactivityReaper::new(10_000).reap(&mut connections, &mut log, 61_000);
        assert_eq!(evicted.len(), 3);
        assert_eq!(connections.len(), 1);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_empty_tracker_is_noop() {
        let mut connections = ConnectionTracker::new();
        let mut log = MessageLog::new();
        assert!(InactivityReaper::default()
            .reap(&mut connections, &mut log, u64::MAX)
            .is_empty());
        assert!(log.is_empty());
    }
}
