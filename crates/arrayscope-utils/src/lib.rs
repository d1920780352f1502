//! # arrayscope Utilities
//!
//! Shared logging setup for the arrayscope workspace.
//!
//! The core library only emits `tracing` events; binaries call into this
//! crate once at startup to decide where those events go.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{format_from_env, init_logging, init_logging_with_level, LogFormat, LogLevel, LoggingError, LoggingGuard};
pub use tracing::{debug, error, info, trace, warn};
