//! Session identity storage trait.
//!
//! Backends hold `SessionIdentity` records keyed by session token. The
//! impersonation controller is the only caller of the write methods; the
//! version check on [`replace`](SessionIdentityStore::replace) and
//! [`rotate`](SessionIdentityStore::rotate) guards against lost updates if
//! two writers ever race on the same token.

use super::{SessionIdentity, SessionToken};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait SessionIdentityStore: Send + Sync {
    /// Load the identity for `token`.
    ///
    /// Returns `Ok(None)` if the session doesn't exist or has expired.
    async fn get(&self, token: &SessionToken) -> Result<Option<SessionIdentity>>;

    /// Store a new session.
    ///
    /// Fails with `InvalidState` if the token is already in use.
    async fn create(&self, token: &SessionToken, identity: SessionIdentity) -> Result<()>;

    /// Replace the identity for `token` if its stored version still equals
    /// `expected_version`.
    ///
    /// Fails with `InvalidState` on a version mismatch and `Unauthenticated`
    /// when the session is gone.
    async fn replace(
        &self,
        token: &SessionToken,
        expected_version: u64,
        identity: SessionIdentity,
    ) -> Result<()>;

    /// Move a session to a new token, replacing its identity in the same step.
    ///
    /// The old token stops resolving before the call returns. Version and
    /// absence are checked as for [`replace`](Self::replace).
    async fn rotate(
        &self,
        old_token: &SessionToken,
        new_token: &SessionToken,
        expected_version: u64,
        identity: SessionIdentity,
    ) -> Result<()>;

    /// Delete a session. Returns whether it existed.
    async fn destroy(&self, token: &SessionToken) -> Result<bool>;

    /// Remove expired sessions.
    ///
    /// This is typically called periodically by the application.
    async fn cleanup_expired(&self) -> Result<usize>;

    /// Check if the session store is healthy
    fn is_healthy(&self) -> bool;
}

#[async_trait]
impl<T: SessionIdentityStore + ?Sized> SessionIdentityStore for Arc<T> {
    async fn get(&self, token: &SessionToken) -> Result<Option<SessionIdentity>> {
        (**self).get(token).await
    }

    async fn create(&self, token: &SessionToken, identity: SessionIdentity) -> Result<()> {
        (**self).create(token, identity).await
    }

    async fn replace(
        &self,
        token: &SessionToken,
        expected_version: u64,
        identity: SessionIdentity,
    ) -> Result<()> {
        (**self).replace(token, expected_version, identity).await
    }

    async fn rotate(
        &self,
        old_token: &SessionToken,
        new_token: &SessionToken,
        expected_version: u64,
        identity: SessionIdentity,
    ) -> Result<()> {
        (**self)
            .rotate(old_token, new_token, expected_version, identity)
            .await
    }

    async fn destroy(&self, token: &SessionToken) -> Result<bool> {
        (**self).destroy(token).await
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        (**self).cleanup_expired().await
    }

    fn is_healthy(&self) -> bool {
        (**self).is_healthy()
    }
}
