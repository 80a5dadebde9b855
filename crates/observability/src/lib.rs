//! Process-wide logging setup for binaries built on the codec.

/// Initialize process-wide observability (tracing/logging).
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing subscriber configuration (filters, output format).
pub mod tracing;
