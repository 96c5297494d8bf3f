//! Shared infrastructure for the peerlink workspace
//!
//! This crate provides the cross-cutting plumbing used by the session and
//! media layers:
//!
//! - **Events** - A generic, typed notifier that entities compose for their
//!   pub/sub surfaces, with explicit subscribe/unsubscribe and at-most-once
//!   subscriptions.
//! - **Logging** - `tracing` subscriber setup shared by binaries and tests.

pub mod events;
pub mod logging;

pub use events::{Notifier, SubscriptionId};
pub use logging::{parse_log_level, setup_logging, LoggingConfig};
