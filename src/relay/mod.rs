//! Relay operations
//!
//! - state: `ChatRelay`, the single owner of all mutable relay state
//! - retention: cursor clamping and log pruning
//! - reaper: eviction of idle connections
//! - scheduler: the two periodic tick tasks

pub mod reaper;
pub mod retention;
pub mod scheduler;
pub mod state;

pub use reaper::InactivityReaper;
pub use retention::{RetentionPolicy, RetentionReport};
pub use scheduler::Scheduler;
pub use state::{ChatRelay, SharedRelay};
