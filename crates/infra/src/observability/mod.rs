//! Tracing subscriber setup for the CLI.

pub mod logging;

pub use logging::{init_logging, LogOptions, LOG_FILE_NAME};
