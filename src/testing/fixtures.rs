//! In-memory fixtures for exercising the identity core end to end.

use crate::access::{AccessTables, IMPERSONATE_ACCOUNTS, PermissionResolver};
use crate::accounts::{
    Account, AccountDirectory, AccountId, CredentialVerifier, InMemoryAccountDirectory,
};
use crate::audit::{AuditEmitter, AuditRecord, AuditSink, InMemoryAuditSink};
use crate::error::{Result, StaffgateError};
use crate::http::{self, IdentityContext};
use crate::impersonation::{ImpersonationConfig, ImpersonationController};
use crate::session::{InMemorySessionIdentityStore, SessionIdentityStore, SessionToken};
use async_trait::async_trait;
use axum::Router;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Secret accepted by [`TestIdentity`] for every seeded account.
pub const TEST_SECRET: &str = "correct-horse";

/// Credential verifier backed by a fixed account/secret map.
#[derive(Clone, Default)]
pub struct StaticCredentialVerifier {
    secrets: Arc<DashMap<AccountId, String>>,
}

impl StaticCredentialVerifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_secret(self, account_id: impl Into<AccountId>, secret: impl Into<String>) -> Self {
        self.secrets.insert(account_id.into(), secret.into());
        self
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentialVerifier {
    async fn verify(&self, account_id: &AccountId, secret: &str) -> Result<Option<AccountId>> {
        Ok(self
            .secrets
            .get(account_id)
            .filter(|expected| expected.as_str() == secret)
            .map(|_| account_id.clone()))
    }
}

/// Audit sink whose writes always fail.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingAuditSink;

#[async_trait]
impl AuditSink for FailingAuditSink {
    async fn append(&self, _record: &AuditRecord) -> Result<()> {
        Err(StaffgateError::internal("audit sink unavailable"))
    }
}

/// The accounts every [`TestIdentity`] starts with.
///
/// | id | role | notes |
/// |---|---|---|
/// | 1 | super_admin | `ops@example.com` |
/// | 2 | super_admin | |
/// | 3 | viewer | explicit `impersonate_accounts` |
/// | 42 | facility_admin | facility `fac-1` |
/// | 43 | staff | inactive |
/// | 50 | billing | |
#[must_use]
pub fn standard_accounts() -> Vec<Account> {
    vec![
        Account::new("1", "super_admin").with_email("ops@example.com"),
        Account::new("2", "super_admin"),
        Account::new("3", "viewer").with_permissions([IMPERSONATE_ACCOUNTS]),
        Account::new("42", "facility_admin").with_facility("fac-1"),
        Account::new("43", "staff").inactive(),
        Account::new("50", "billing"),
    ]
}

/// A fully wired identity core over in-memory backends.
///
/// Holds on to the directory, store and audit sink so tests can inspect or
/// mutate them behind the router's back.
#[derive(Clone)]
pub struct TestIdentity {
    pub accounts: InMemoryAccountDirectory,
    pub store: InMemorySessionIdentityStore,
    pub audit: InMemoryAuditSink,
    context: IdentityContext,
}

impl TestIdentity {
    /// Standard accounts, standard access tables, default impersonation rules.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ImpersonationConfig::default())
    }

    #[must_use]
    pub fn with_config(config: ImpersonationConfig) -> Self {
        Self::build(config, AccessTables::standard(), None)
    }

    /// Like [`with_config`](Self::with_config), but every audit write fails.
    #[must_use]
    pub fn with_failing_audit(config: ImpersonationConfig) -> Self {
        Self::build(config, AccessTables::standard(), Some(Arc::new(FailingAuditSink)))
    }

    #[must_use]
    pub fn with_tables(tables: AccessTables) -> Self {
        Self::build(ImpersonationConfig::default(), tables, None)
    }

    fn build(
        config: ImpersonationConfig,
        tables: AccessTables,
        sink: Option<Arc<dyn AuditSink>>,
    ) -> Self {
        let accounts = InMemoryAccountDirectory::with_accounts(standard_accounts());
        let store = InMemorySessionIdentityStore::new();
        let audit = InMemoryAuditSink::new();

        let verifier = standard_accounts()
            .into_iter()
            .fold(StaticCredentialVerifier::new(), |v, account| {
                v.with_secret(account.id, TEST_SECRET)
            });

        let sink = sink.unwrap_or_else(|| Arc::new(audit.clone()) as Arc<dyn AuditSink>);

        let controller = ImpersonationController::new(
            Arc::new(store.clone()) as Arc<dyn SessionIdentityStore>,
            Arc::new(accounts.clone()) as Arc<dyn AccountDirectory>,
            PermissionResolver::new(tables.roles),
            AuditEmitter::new(sink),
        )
        .with_config(config);

        let context = IdentityContext::new(controller, tables.pages, Arc::new(verifier));

        Self {
            accounts,
            store,
            audit,
            context,
        }
    }

    #[must_use]
    pub fn context(&self) -> &IdentityContext {
        &self.context
    }

    #[must_use]
    pub fn controller(&self) -> &ImpersonationController {
        self.context.controller()
    }

    /// A fresh router over the shared state.
    #[must_use]
    pub fn router(&self) -> Router {
        http::router(self.context.clone())
    }

    /// Open a session for `account_id` directly through the controller.
    pub async fn login(&self, account_id: &str) -> SessionToken {
        let (token, _) = self
            .controller()
            .open_session(&AccountId::from(account_id))
            .await
            .expect("test account should be able to log in");
        token
    }
}

impl Default for TestIdentity {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper functions for generating fake test data
pub mod fake {
    use super::*;

    /// Generate a fake email address
    pub fn email() -> String {
        format!("test-{}@example.com", Uuid::new_v4().simple())
    }

    /// Generate a fresh account id
    pub fn account_id() -> AccountId {
        AccountId::new(Uuid::new_v4().to_string())
    }

    /// Generate an active account with the given role and a fake email
    pub fn account(role: &str) -> Account {
        Account::new(account_id(), role).with_email(email())
    }
}
