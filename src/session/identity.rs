use crate::accounts::AccountId;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque session token handed to the client.
///
/// `Debug` output is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a fresh token: 32 bytes from the OS RNG, base64url encoded.
    #[must_use]
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap a token received from a client.
    #[must_use]
    pub fn from_client(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe to put in logs for correlation.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken({}…)", self.fingerprint())
    }
}

/// The identity bound to one session token.
///
/// A session is either normal (effective account equals original account)
/// or impersonating (effective account is the target and
/// `impersonation_started_at` is set). Fields are private and only the
/// impersonation controller can move a record between the two states.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    original_account_id: AccountId,
    effective_account_id: AccountId,
    impersonation_started_at: Option<DateTime<Utc>>,
    impersonation_reason: Option<String>,
    session_version: u64,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionIdentity {
    /// A fresh, normal session for `account_id`.
    pub(crate) fn new(account_id: AccountId, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            effective_account_id: account_id.clone(),
            original_account_id: account_id,
            impersonation_started_at: None,
            impersonation_reason: None,
            session_version: 0,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Next version of this record, impersonating `target`.
    pub(crate) fn begin_impersonation(
        &self,
        target: AccountId,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            effective_account_id: target,
            impersonation_started_at: Some(at),
            impersonation_reason: reason,
            session_version: self.session_version + 1,
            ..self.clone()
        }
    }

    /// Next version of this record, back to the original account.
    pub(crate) fn end_impersonation(&self) -> Self {
        Self {
            effective_account_id: self.original_account_id.clone(),
            impersonation_started_at: None,
            impersonation_reason: None,
            session_version: self.session_version + 1,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn original_account_id(&self) -> &AccountId {
        &self.original_account_id
    }

    #[must_use]
    pub fn effective_account_id(&self) -> &AccountId {
        &self.effective_account_id
    }

    #[must_use]
    pub fn impersonation_started_at(&self) -> Option<DateTime<Utc>> {
        self.impersonation_started_at
    }

    #[must_use]
    pub fn impersonation_reason(&self) -> Option<&str> {
        self.impersonation_reason.as_deref()
    }

    #[must_use]
    pub fn session_version(&self) -> u64 {
        self.session_version
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[must_use]
    pub fn is_impersonating(&self) -> bool {
        self.impersonation_started_at.is_some()
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Whether the impersonation fields agree with each other.
    ///
    /// Normal: effective == original, no start time, no reason.
    /// Impersonating: effective != original, start time set.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        match self.impersonation_started_at {
            None => {
                self.effective_account_id == self.original_account_id
                    && self.impersonation_reason.is_none()
            }
            Some(_) => self.effective_account_id != self.original_account_id,
        }
    }
}
