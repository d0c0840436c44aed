//! Impersonation audit trail.
//!
//! Every impersonation start, stop and expiry produces an [`AuditRecord`].
//! Records go through an [`AuditEmitter`] into an [`AuditSink`].

mod emitter;
mod record;
mod sink;

pub use emitter::AuditEmitter;
pub use record::{AuditAction, AuditRecord};
pub use sink::{AuditSink, InMemoryAuditSink, TracingAuditSink};
