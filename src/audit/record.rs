use crate::accounts::AccountId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Impersonation audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Unique identifier for this record.
    pub id: String,
    /// The account that started the impersonation.
    pub operator_id: AccountId,
    /// The account being impersonated.
    pub target_id: AccountId,
    pub action: AuditAction,
    /// Reason given when the impersonation started.
    pub reason: Option<String>,
    /// Extra context, e.g. the action that was blocked.
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Impersonation audit actions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Impersonation started.
    Start,
    /// Impersonation ended by the operator, or by logging out.
    Stop,
    /// Impersonation ran past its maximum duration and was ended.
    Expired,
    /// A blocked action was attempted while impersonating.
    Blocked,
}

impl AuditAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Expired => "expired",
            Self::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AuditRecord {
    /// Create a record stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(action: AuditAction, operator_id: AccountId, target_id: AccountId) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            operator_id,
            target_id,
            action,
            reason: None,
            detail: None,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: Option<&str>) -> Self {
        self.reason = reason.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
