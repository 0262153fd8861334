//! Relay state owner
//!
//! `ChatRelay` owns the message log, the client registry and the connection
//! tracker. Every mutation goes through it, and callers share it behind one
//! exclusive lock (`SharedRelay`), so an operation always applies fully or,
//! on a precondition failure, not at all.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::core::{
    now_millis, ClientRegistry, ConnectionTracker, Message, MessageLog, Millis,
};
use crate::infrastructure::metrics::RelayMetrics;
use crate::infrastructure::storage::Snapshot;
use crate::relay::reaper::InactivityReaper;
use crate::relay::retention::{RetentionPolicy, RetentionReport};
use crate::{RelayConfig, RelayError, Result};

/// Sender name used for join/leave notices
pub const SERVER_SENDER: &str = "Server";

/// Relay state shared between the API and the periodic ticks
pub type SharedRelay = Arc<Mutex<ChatRelay>>;

pub struct ChatRelay {
    log: MessageLog,
    clients: ClientRegistry,
    connections: ConnectionTracker,
    retention: RetentionPolicy,
    reaper: InactivityReaper,
    metrics: Arc<RelayMetrics>,
}

impl ChatRelay {
    /// Create an empty relay
    pub fn new(config: &RelayConfig, metrics: Arc<RelayMetrics>) -> Self {
        Self {
            log: MessageLog::new(),
            clients: ClientRegistry::new(),
            connections: ConnectionTracker::new(),
            retention: RetentionPolicy::new(config.max_message_offset),
            reaper: InactivityReaper::new(config.inactivity_timeout_ms),
            metrics,
        }
    }

    /// Restore clients and messages from a snapshot.
    ///
    /// Connections are never persisted; everyone starts disconnected.
    pub fn restore(&mut self, snapshot: Snapshot) {
        if let Some(clients) = snapshot.clients {
            self.clients = ClientRegistry::from_records(clients);
        }
        if let Some(messages) = snapshot.messages {
            self.log = MessageLog::from_messages(messages);
        }
    }

    /// Wrap into the shared, lock-guarded form
    pub fn into_shared(self) -> SharedRelay {
        Arc::new(Mutex::new(self))
    }

    /// Connect a client and return what it has not seen yet
    pub fn connect(&mut self, name: &str) -> Result<Vec<Message>> {
        self.connect_at(name, now_millis())
    }

    pub fn connect_at(&mut self, name: &str, now: Millis) -> Result<Vec<Message>> {
        require("from", name)?;
        if self.connections.is_active(name) {
            return Err(RelayError::AlreadyConnected(name.to_string()));
        }

        self.clients.get_or_create(name, &self.log);
        self.connections.touch(name, now);
        self.log
            .append(SERVER_SENDER, format!("{} has joined the chat.", name));
        self.metrics.record_connect();

        Ok(self.clients.resolve_and_advance(name, &self.log))
    }

    /// Drop a client's connection. Its history record stays.
    pub fn disconnect(&mut self, name: &str) -> Result<()> {
        require("from", name)?;
        if !self.connections.remove(name) {
            return Err(RelayError::NotConnected(name.to_string()));
        }

        self.log.append(SERVER_SENDER, format!("{} has left.", name));
        self.metrics.record_disconnect();
        Ok(())
    }

    /// Post a message and return pending messages for the sender.
    ///
    /// The sender's own message is the log tail and is not in the result.
    pub fn post_message(&mut self, from: &str, text: &str) -> Result<Vec<Message>> {
        self.post_message_at(from, text, now_millis())
    }

    pub fn post_message_at(&mut self, from: &str, text: &str, now: Millis) -> Result<Vec<Message>> {
        require("from", from)?;
        require("text", text)?;
        if !self.connections.is_active(from) {
            return Err(RelayError::NotConnected(from.to_string()));
        }
        if !self.clients.contains(from) {
            return Err(RelayError::UnknownClient(from.to_string()));
        }

        self.connections.touch(from, now);
        self.log.append(from, text);
        self.metrics.record_post();

        Ok(self.clients.resolve_and_advance(from, &self.log))
    }

    /// Refresh liveness and return pending messages
    pub fn poll_update(&mut self, name: &str) -> Result<Vec<Message>> {
        self.poll_update_at(name, now_millis())
    }

    pub fn poll_update_at(&mut self, name: &str, now: Millis) -> Result<Vec<Message>> {
        require("from", name)?;
        if !self.connections.is_active(name) {
            return Err(RelayError::NotConnected(name.to_string()));
        }

        self.connections.touch(name, now);
        Ok(self.clients.resolve_and_advance(name, &self.log))
    }

    /// Clamp lagging cursors and prune below the retention floor
    pub fn run_message_cleanup(&mut self) -> RetentionReport {
        let report = self.retention.apply(&mut self.clients, &mut self.log);
        self.metrics
            .record_retention(report.pruned, report.clamped.len());
        if report.pruned > 0 {
            crate::log_relay!(
                tracing::Level::DEBUG,
                "Pruned {} messages below floor {:?}",
                report.pruned,
                report.floor
            );
        }
        report
    }

    /// Evict idle connections. Returns the evicted names.
    pub fn run_inactivity_check(&mut self) -> Vec<String> {
        self.run_inactivity_check_at(now_millis())
    }

    pub fn run_inactivity_check_at(&mut self, now: Millis) -> Vec<String> {
        let evicted = self.reaper.reap(&mut self.connections, &mut self.log, now);
        self.metrics.record_timeouts(evicted.len());
        crate::log_relay!(
            tracing::Level::DEBUG,
            "Connections: {:?}.",
            self.connections.names().collect::<Vec<_>>()
        );
        evicted
    }

    /// Copy of the persisted state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.clients.records(), self.log.all())
    }

    pub fn is_connected(&self, name: &str) -> bool {
        self.connections.is_active(name)
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub fn connections(&self) -> &ConnectionTracker {
        &self.connections
    }

    pub fn metrics(&self) -> Arc<RelayMetrics> {
        self.metrics.clone()
    }
}

#[inline]
fn require(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(RelayError::MissingField(field));
    }
    Ok(())
}
