//! Metrics collection for relay monitoring
//!
//! Lock-free counters bumped by relay operations and the periodic ticks,
//! exported through the `/stats` endpoint.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Relay metrics collector
pub struct RelayMetrics {
    /// Messages posted by clients
    messages_posted: AtomicU64,
    /// Successful connects
    connects: AtomicU64,
    /// Explicit disconnects
    disconnects: AtomicU64,
    /// Connections evicted by the reaper
    timeouts: AtomicU64,
    /// Messages removed by retention
    messages_pruned: AtomicU64,
    /// Cursors forced forward by retention
    cursors_clamped: AtomicU64,
    /// Failed snapshot writes
    snapshot_failures: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

/// Metrics snapshot for API export
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub messages_posted: u64,
    pub connects: u64,
    pub disconnects: u64,
    pub timeouts: u64,
    pub messages_pruned: u64,
    pub cursors_clamped: u64,
    pub snapshot_failures: u64,
    pub uptime_seconds: u64,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self {
            messages_posted: AtomicU64::new(0),
            connects: AtomicU64::new(0),
            disconnects: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            messages_pruned: AtomicU64::new(0),
            cursors_clamped: AtomicU64::new(0),
            snapshot_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    #[inline]
    pub fn record_post(&self) {
        self.messages_posted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_connect(&self) {
        self.connects.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeouts(&self, count: usize) {
        self.timeouts.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_retention(&self, pruned: usize, clamped: usize) {
        self.messages_pruned.fetch_add(pruned as u64, Ordering::Relaxed);
        self.cursors_clamped.fetch_add(clamped as u64, Ordering::Relaxed);
    }

    pub fn record_snapshot_failure(&self) {
        self.snapshot_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current snapshot of metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_posted: self.messages_posted.load(Ordering::Relaxed),
            connects: self.connects.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            messages_pruned: self.messages_pruned.load(Ordering::Relaxed),
            cursors_clamped: self.cursors_clamped.load(Ordering::Relaxed),
            snapshot_failures: self.snapshot_failures.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for RelayMetrics {
    fn default() -> Self {
        Self::new()
    }
}
