//! Infrastructure - everything around the relay core
//!
//! This module contains:
//! - Configuration management
//! - Logging and metrics
//! - Snapshot persistence
//! - HTTP API

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod storage;

pub use api::{router, start_server, AppState};
