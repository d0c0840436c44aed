use super::{AuditAction, AuditRecord};
use crate::accounts::AccountId;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

/// Destination for audit records.
///
/// Implementations append; records are never updated or removed.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, record: &AuditRecord) -> Result<()>;
}

#[async_trait]
impl<T: AuditSink + ?Sized> AuditSink for Arc<T> {
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        (**self).append(record).await
    }
}

/// In-memory audit sink.
///
/// Keeps every record in insertion order. For tests and development.
#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl InMemoryAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All records so far.
    ///
    /// Reads through a poisoned lock; records are append-only.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records where `account` was operator or target, newest first.
    #[must_use]
    pub fn records_for(&self, account: &AccountId, limit: usize) -> Vec<AuditRecord> {
        self.records()
            .into_iter()
            .rev()
            .filter(|r| &r.operator_id == account || &r.target_id == account)
            .take(limit)
            .collect()
    }

    /// Actions in insertion order.
    #[must_use]
    pub fn actions(&self) -> Vec<AuditAction> {
        self.records().iter().map(|r| r.action).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| crate::error::StaffgateError::internal("audit sink lock poisoned"))?;
        records.push(record.clone());
        Ok(())
    }
}

/// Audit sink that writes records as structured log events.
///
/// Pair with a log pipeline that retains the `staffgate.audit` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        tracing::info!(
            target: "staffgate.audit",
            audit_id = %record.id,
            action = %record.action,
            operator_id = %record.operator_id,
            target_id = %record.target_id,
            reason = record.reason.as_deref().unwrap_or("none"),
            detail = record.detail.as_deref().unwrap_or(""),
            timestamp = %record.timestamp.to_rfc3339(),
            "Impersonation audit record"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_appends_in_order() {
        let sink = InMemoryAuditSink::new();
        sink.append(&AuditRecord::new(AuditAction::Start, "1".into(), "42".into()))
            .await
            .unwrap();
        sink.append(&AuditRecord::new(AuditAction::Stop, "1".into(), "42".into()))
            .await
            .unwrap();

        assert_eq!(sink.actions(), vec![AuditAction::Start, AuditAction::Stop]);
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn test_records_for() {
        let sink = InMemoryAuditSink::new();
        sink.append(&AuditRecord::new(AuditAction::Start, "1".into(), "42".into()))
            .await
            .unwrap();
        sink.append(&AuditRecord::new(AuditAction::Start, "2".into(), "7".into()))
            .await
            .unwrap();
        sink.append(&AuditRecord::new(AuditAction::Stop, "1".into(), "42".into()))
            .await
            .unwrap();

        let for_42 = sink.records_for(&"42".into(), 10);
        assert_eq!(for_42.len(), 2);
        assert_eq!(for_42[0].action, AuditAction::Stop);

        assert_eq!(sink.records_for(&"2".into(), 10).len(), 1);
        assert_eq!(sink.records_for(&"1".into(), 1).len(), 1);
    }

    #[tokio::test]
    async fn test_reads_survive_poisoned_lock() {
        let sink = InMemoryAuditSink::new();
        sink.append(&AuditRecord::new(AuditAction::Start, "1".into(), "42".into()))
            .await
            .unwrap();

        let records = Arc::clone(&sink.records);
        let _ = std::thread::spawn(move || {
            let _guard = records.lock().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(sink.records.is_poisoned());

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.records()[0].target_id.as_str(), "42");
        assert_eq!(sink.actions(), vec![AuditAction::Start]);
    }

    #[tokio::test]
    async fn test_tracing_sink_accepts_records() {
        let sink = TracingAuditSink;
        let record = AuditRecord::new(AuditAction::Start, "1".into(), "42".into());
        assert!(sink.append(&record).await.is_ok());
    }
}
