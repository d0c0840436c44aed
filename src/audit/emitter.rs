use super::{AuditRecord, AuditSink};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Best-effort audit writer.
///
/// An audit failure never fails the state transition that produced the
/// record. It is logged at error level under `staffgate.audit.failed`, with
/// the full record, and counted in [`failed_writes`](Self::failed_writes).
#[derive(Clone)]
pub struct AuditEmitter {
    sink: Arc<dyn AuditSink>,
    failed: Arc<AtomicU64>,
}

impl AuditEmitter {
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            failed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Append `record`, logging instead of failing.
    pub async fn emit(&self, record: AuditRecord) {
        if let Err(e) = self.sink.append(&record).await {
            self.failed.fetch_add(1, Ordering::Relaxed);
            tracing::error!(
                target: "staffgate.audit.failed",
                audit_id = %record.id,
                action = %record.action,
                operator_id = %record.operator_id,
                target_id = %record.target_id,
                reason = record.reason.as_deref().unwrap_or("none"),
                timestamp = %record.timestamp.to_rfc3339(),
                error = %e,
                "Failed to write impersonation audit record"
            );
        }
    }

    /// Number of records that could not be written since startup.
    #[must_use]
    pub fn failed_writes(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}
