//! Logging setup and request correlation shared by the binaries.

/// Initialize process-wide structured logging.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init("info");
}

/// Subscriber configuration (filters, JSON layer).
pub mod tracing;

/// Request correlation ids.
pub mod request_id;

pub use request_id::{RequestId, REQUEST_ID_HEADER};
