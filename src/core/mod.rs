//! Core relay state
//!
//! The three collections every relay operation works on:
//! - MessageLog: ordered messages with monotonic ids
//! - ClientRegistry: per-client read cursors
//! - ConnectionTracker: last-activity timestamps of connected clients

pub mod client;
pub mod connection;
pub mod message;

pub use client::{ClientRecord, ClientRegistry};
pub use connection::{now_millis, ConnectionTracker, Millis};
pub use message::{Message, MessageId, MessageLog, NO_MESSAGE};
