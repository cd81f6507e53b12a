//! Tracing/logging setup shared by the binaries.

/// Tracing configuration (filters, formatters).
pub mod tracing;

pub use self::tracing::{LogFormat, init, init_with};
