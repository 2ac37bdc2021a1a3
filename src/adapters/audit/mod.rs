//! Audit log adapters.

mod tracing_log;

pub use tracing_log::TracingAuditLog;
