use super::{SessionIdentity, SessionIdentityStore, SessionToken};
use crate::error::{Result, StaffgateError};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// In-memory session identity store.
///
/// Stores sessions in a sharded `DashMap`, so sessions on different shards
/// never contend. Suitable for development, testing and single-instance
/// deployments (sessions are lost on restart and not shared across
/// instances).
#[derive(Clone, Default)]
pub struct InMemorySessionIdentityStore {
    sessions: Arc<DashMap<String, SessionIdentity>>,
}

impl InMemorySessionIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Check the stored record for `token` against `expected_version`.
    ///
    /// Expired records are removed and reported as absent.
    fn check_version(&self, token: &SessionToken, expected_version: u64) -> Result<()> {
        let current = self
            .sessions
            .get(token.as_str())
            .map(|entry| (entry.session_version(), entry.is_expired()));

        match current {
            None => Err(StaffgateError::unauthenticated("session not found")),
            Some((_, true)) => {
                self.sessions
                    .remove_if(token.as_str(), |_, s| s.is_expired());
                Err(StaffgateError::unauthenticated("session expired"))
            }
            Some((version, false)) if version != expected_version => {
                Err(StaffgateError::invalid_state(format!(
                    "session changed concurrently (expected version {}, found {})",
                    expected_version, version
                )))
            }
            Some(_) => Ok(()),
        }
    }
}

#[async_trait]
impl SessionIdentityStore for InMemorySessionIdentityStore {
    async fn get(&self, token: &SessionToken) -> Result<Option<SessionIdentity>> {
        // Clone out before removing; holding a shard ref across remove deadlocks.
        let found = self
            .sessions
            .get(token.as_str())
            .map(|entry| entry.value().clone());

        match found {
            Some(identity) if identity.is_expired() => {
                self.sessions
                    .remove_if(token.as_str(), |_, s| s.is_expired());
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn create(&self, token: &SessionToken, identity: SessionIdentity) -> Result<()> {
        match self.sessions.entry(token.as_str().to_string()) {
            Entry::Occupied(_) => Err(StaffgateError::invalid_state("session token already in use")),
            Entry::Vacant(slot) => {
                slot.insert(identity);
                Ok(())
            }
        }
    }

    async fn replace(
        &self,
        token: &SessionToken,
        expected_version: u64,
        identity: SessionIdentity,
    ) -> Result<()> {
        self.check_version(token, expected_version)?;

        let mut entry = self
            .sessions
            .get_mut(token.as_str())
            .ok_or_else(|| StaffgateError::unauthenticated("session not found"))?;
        if entry.session_version() != expected_version {
            return Err(StaffgateError::invalid_state(
                "session changed concurrently",
            ));
        }
        *entry = identity;
        Ok(())
    }

    async fn rotate(
        &self,
        old_token: &SessionToken,
        new_token: &SessionToken,
        expected_version: u64,
        identity: SessionIdentity,
    ) -> Result<()> {
        self.check_version(old_token, expected_version)?;

        if self
            .sessions
            .remove_if(old_token.as_str(), |_, s| {
                s.session_version() == expected_version
            })
            .is_none()
        {
            return Err(StaffgateError::invalid_state(
                "session changed concurrently",
            ));
        }

        match self.sessions.entry(new_token.as_str().to_string()) {
            Entry::Occupied(_) => Err(StaffgateError::internal(
                "rotated session token collided with an existing session",
            )),
            Entry::Vacant(slot) => {
                slot.insert(identity);
                Ok(())
            }
        }
    }

    async fn destroy(&self, token: &SessionToken) -> Result<bool> {
        Ok(self.sessions.remove(token.as_str()).is_some())
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        let mut removed = 0;
        self.sessions.retain(|_, session| {
            let keep = !session.is_expired();
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }

    fn is_healthy(&self) -> bool {
        true // In-memory store is always healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountId;
    use chrono::{Duration, Utc};

    fn identity(id: &str) -> SessionIdentity {
        SessionIdentity::new(AccountId::from(id), Duration::hours(1))
    }

    #[tokio::test]
    async fn test_create_get() {
        let store = InMemorySessionIdentityStore::new();
        let token = SessionToken::generate();

        store.create(&token, identity("1")).await.unwrap();

        let loaded = store.get(&token).await.unwrap().unwrap();
        assert_eq!(loaded.original_account_id().as_str(), "1");
        assert!(store.get(&SessionToken::generate()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_token() {
        let store = InMemorySessionIdentityStore::new();
        let token = SessionToken::generate();

        store.create(&token, identity("1")).await.unwrap();
        let err = store.create(&token, identity("2")).await.unwrap_err();
        assert!(matches!(err, StaffgateError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_replace_checks_version() {
        let store = InMemorySessionIdentityStore::new();
        let token = SessionToken::generate();
        let original = identity("1");
        store.create(&token, original.clone()).await.unwrap();

        let next = original.begin_impersonation(AccountId::from("42"), None, Utc::now());
        store.replace(&token, 0, next.clone()).await.unwrap();

        // A second writer still holding version 0 loses.
        let stale = original.begin_impersonation(AccountId::from("43"), None, Utc::now());
        let err = store.replace(&token, 0, stale).await.unwrap_err();
        assert!(matches!(err, StaffgateError::InvalidState(_)));

        let loaded = store.get(&token).await.unwrap().unwrap();
        assert_eq!(loaded, next);
    }

    #[tokio::test]
    async fn test_replace_missing_session() {
        let store = InMemorySessionIdentityStore::new();
        let err = store
            .replace(&SessionToken::generate(), 0, identity("1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StaffgateError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_rotate() {
        let store = InMemorySessionIdentityStore::new();
        let old = SessionToken::generate();
        let new = SessionToken::generate();
        let original = identity("1");
        store.create(&old, original.clone()).await.unwrap();

        let next = original.end_impersonation();
        store.rotate(&old, &new, 0, next.clone()).await.unwrap();

        assert!(store.get(&old).await.unwrap().is_none());
        assert_eq!(store.get(&new).await.unwrap().unwrap(), next);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_rotate_stale_version_keeps_old_token() {
        let store = InMemorySessionIdentityStore::new();
        let old = SessionToken::generate();
        let new = SessionToken::generate();
        store.create(&old, identity("1")).await.unwrap();

        let err = store
            .rotate(&old, &new, 5, identity("1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StaffgateError::InvalidState(_)));
        assert!(store.get(&old).await.unwrap().is_some());
        assert!(store.get(&new).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_destroy() {
        let store = InMemorySessionIdentityStore::new();
        let token = SessionToken::generate();
        store.create(&token, identity("1")).await.unwrap();

        assert!(store.destroy(&token).await.unwrap());
        assert!(!store.destroy(&token).await.unwrap());
        assert!(store.get(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_reads_as_absent() {
        let store = InMemorySessionIdentityStore::new();
        let token = SessionToken::generate();
        let expired = SessionIdentity::new(AccountId::from("1"), Duration::zero());
        store.create(&token, expired).await.unwrap();

        assert!(store.get(&token).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let store = InMemorySessionIdentityStore::new();

        let expired = SessionToken::generate();
        store
            .create(
                &expired,
                SessionIdentity::new(AccountId::from("1"), Duration::zero()),
            )
            .await
            .unwrap();

        let valid = SessionToken::generate();
        store.create(&valid, identity("2")).await.unwrap();

        let removed = store.cleanup_expired().await.unwrap();
        assert_eq!(removed, 1);

        assert!(store.get(&expired).await.unwrap().is_none());
        assert!(store.get(&valid).await.unwrap().is_some());
    }
}
