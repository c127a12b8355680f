//! Staffboard audit event plumbing.
//!
//! - [`AuditBus`]: in-process fan-out of [`AuditEvent`]s over
//!   `tokio::sync::broadcast`, usable wherever the core expects an
//!   [`AuditSink`].
//! - [`AuditPersistence`]: background task writing every event on the bus
//!   to the `audit_logs` table, redacted.
//!
//! [`AuditEvent`]: staffboard_core::audit::AuditEvent
//! [`AuditSink`]: staffboard_core::audit::AuditSink

pub mod bus;
pub mod persistence;

pub use bus::AuditBus;
pub use persistence::{AuditPersistence, AuditWriter};
