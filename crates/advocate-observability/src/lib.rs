//! Structured logging for Advocate binaries.
//!
//! Library crates only emit `tracing` events; the binary calls [`init_logging`]
//! once at startup and keeps the returned [`LogGuard`] alive until exit.

pub mod logging;

pub use logging::{build_filter, init_logging, LogGuard, ObservabilityError, Result};
