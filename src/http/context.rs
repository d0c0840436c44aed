use crate::access::{PageAccessPolicy, PermissionResolver};
use crate::accounts::{AccountDirectory, CredentialVerifier};
use crate::audit::{AuditEmitter, AuditSink, TracingAuditSink};
use crate::config::Config;
use crate::error::Result;
use crate::impersonation::ImpersonationController;
use crate::session::{InMemorySessionIdentityStore, SessionIdentityStore};
use std::sync::Arc;

/// Shared state for the identity routes.
#[derive(Clone)]
pub struct IdentityContext {
    controller: ImpersonationController,
    pages: Arc<PageAccessPolicy>,
    verifier: Arc<dyn CredentialVerifier>,
    cookie_name: String,
}

impl IdentityContext {
    #[must_use]
    pub fn new(
        controller: ImpersonationController,
        pages: Arc<PageAccessPolicy>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            controller,
            pages,
            verifier,
            cookie_name: crate::session::SessionConfig::default().cookie_name,
        }
    }

    /// Wire a context from configuration.
    ///
    /// Loads the access tables and uses an in-memory session store with a
    /// tracing audit sink. Use [`from_parts`](Self::from_parts) to supply
    /// other backends.
    ///
    /// # Errors
    ///
    /// Returns [`StaffgateError::Config`](crate::StaffgateError::Config) when the
    /// access tables cannot be loaded.
    pub fn from_config(
        config: &Config,
        accounts: Arc<dyn AccountDirectory>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Result<Self> {
        Self::from_parts(
            config,
            accounts,
            verifier,
            Arc::new(InMemorySessionIdentityStore::new()),
            Arc::new(TracingAuditSink),
        )
    }

    /// Wire a context from configuration with explicit store and audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`StaffgateError::Config`](crate::StaffgateError::Config) when the
    /// access tables cannot be loaded.
    pub fn from_parts(
        config: &Config,
        accounts: Arc<dyn AccountDirectory>,
        verifier: Arc<dyn CredentialVerifier>,
        store: Arc<dyn SessionIdentityStore>,
        audit_sink: Arc<dyn AuditSink>,
    ) -> Result<Self> {
        let tables = config.load_access()?;

        let controller = ImpersonationController::new(
            store,
            accounts,
            PermissionResolver::new(tables.roles),
            AuditEmitter::new(audit_sink),
        )
        .with_config(config.impersonation.clone())
        .with_session_ttl(config.session.ttl());

        Ok(Self::new(controller, tables.pages, verifier).with_cookie_name(&config.session.cookie_name))
    }

    #[must_use]
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn controller(&self) -> &ImpersonationController {
        &self.controller
    }

    #[must_use]
    pub fn pages(&self) -> &PageAccessPolicy {
        &self.pages
    }

    #[must_use]
    pub fn verifier(&self) -> &dyn CredentialVerifier {
        self.verifier.as_ref()
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }
}
