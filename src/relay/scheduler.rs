//! Periodic relay ticks
//!
//! Two independent interval tasks: the inactivity check and the message
//! cleanup (retention followed by a snapshot write). Each tick holds the
//! relay lock only for the in-memory work; the snapshot is written after
//! the lock is released.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::infrastructure::storage::SnapshotStore;
use crate::relay::SharedRelay;
use crate::RelayConfig;

/// Handles of the running tick tasks
pub struct Scheduler {
    pub inactivity: JoinHandle<()>,
    pub cleanup: JoinHandle<()>,
}

impl Scheduler {
    /// Spawn both tick tasks on the current runtime
    pub fn start(relay: SharedRelay, store: Arc<SnapshotStore>, config: &RelayConfig) -> Self {
        let inactivity = tokio::spawn(inactivity_loop(relay.clone(), config.reaper_interval()));
        let cleanup = tokio::spawn(cleanup_loop(relay, store, config.cleanup_interval()));
        tracing::info!(
            reaper_ms = config.reaper_interval_ms,
            cleanup_ms = config.cleanup_interval_ms,
            "Periodic tasks started"
        );
        Self { inactivity, cleanup }
    }

    pub fn abort(&self) {
        self.inactivity.abort();
        self.cleanup.abort();
    }
}

async fn inactivity_loop(relay: SharedRelay, period: Duration) {
    let mut ticker = interval_after(period);
    loop {
        ticker.tick().await;
        let evicted = relay.lock().run_inactivity_check();
        for name in &evicted {
            crate::log_relay!(tracing::Level::INFO, "Client '{}' timed out", name);
        }
    }
}

async fn cleanup_loop(relay: SharedRelay, store: Arc<SnapshotStore>, period: Duration) {
    let mut ticker = interval_after(period);
    loop {
        ticker.tick().await;
        run_cleanup_tick(&relay, &store).await;
    }
}

/// One cleanup tick: retention under the lock, then persist.
pub async fn run_cleanup_tick(relay: &SharedRelay, store: &SnapshotStore) {
    let (snapshot, metrics) = {
        let mut relay = relay.lock();
        relay.run_message_cleanup();
        (relay.snapshot(), relay.metrics())
    };
    if !store.save(&snapshot).await {
        metrics.record_snapshot_failure();
    }
}

/// Shortest tick period; tokio panics on a zero period
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Interval whose first tick fires one period from now
fn interval_after(period: Duration) -> tokio::time::Interval {
    let period = period.max(MIN_PERIOD);
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
