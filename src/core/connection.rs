//! Connection tracker
//!
//! Liveness records keyed by client name. Independent of the client registry:
//! a client keeps its cursor after its connection is gone.

use std::collections::BTreeMap;

/// Unix timestamp in milliseconds
pub type Millis = u64;

/// Current wall-clock time in milliseconds
#[inline]
pub fn now_millis() -> Millis {
    std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    last_seen: BTreeMap<String, Millis>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh a connection
    pub fn touch(&mut self, name: &str, now: Millis) {
        match self.last_seen.get_mut(name) {
            Some(seen) => *seen = now,
            None => {
                self.last_seen.insert(name.to_string(), now);
            }
        }
    }

    /// Drop a connection, reporting whether it existed
    pub fn remove(&mut self, name: &str) -> bool {
        self.last_seen.remove(name).is_some()
    }

    #[inline]
    pub fn is_active(&self, name: &str) -> bool {
        self.last_seen.contains_key(name)
    }

    pub fn last_seen(&self, name: &str) -> Option<Millis> {
        self.last_seen.get(name).copied()
    }

    /// Names idle for strictly longer than `timeout_ms`
    pub fn expired(&self, now: Millis, timeout_ms: u64) -> Vec<String> {
        self.last_seen
            .iter()
            .filter(|(_, &seen)| now.saturating_sub(seen) > timeout_ms)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.last_seen.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }
}
