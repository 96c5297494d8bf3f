//! Logging setup shared across the workspace

mod setup;

pub use setup::{parse_log_level, setup_logging, LoggingConfig, LoggingError};
