//! Polling chat relay server
//!
//! # Architecture
//! - **core**: message log, client cursors, connection liveness
//! - **relay**: relay operations, retention, inactivity reaper, tick tasks
//! - **infrastructure**: config, logging, metrics, snapshot storage, HTTP API

use chat_relay::infrastructure::metrics::RelayMetrics;
use chat_relay::infrastructure::storage::SnapshotStore;
use chat_relay::infrastructure::{logging, start_server, AppState};
use chat_relay::relay::{ChatRelay, Scheduler};
use chat_relay::{log_main, Config, Result};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let _guards = logging::init_logging("logs")?;

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}; using defaults", e);
            Config::default()
        }
    };

    let metrics = Arc::new(RelayMetrics::new());
    let store = Arc::new(SnapshotStore::new(config.storage.db_path.clone()));

    let mut relay = ChatRelay::new(&config.relay, metrics.clone());
    match store.load().await {
        Some(snapshot) => relay.restore(snapshot),
        None => {
            if store.save(&relay.snapshot()).await {
                log_main!(tracing::Level::INFO, "Successfully created the database.");
            } else {
                log_main!(tracing::Level::WARN, "Could not create the database. Data will NOT be saved.");
            }
        }
    }
    log_main!(
        tracing::Level::INFO,
        clients = relay.clients().len(),
        messages = relay.log().len(),
        "Relay state ready"
    );

    let relay = relay.into_shared();
    let scheduler = Scheduler::start(relay.clone(), store, &config.relay);

    let state = AppState { relay, metrics };
    let result = start_server(state, &config.api).await;
    scheduler.abort();
    result
}
