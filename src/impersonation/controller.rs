use super::config::ImpersonationConfig;
use super::view::{IdentityView, ResolvedSession};
use crate::access::PermissionResolver;
use crate::accounts::{Account, AccountDirectory, AccountId};
use crate::audit::{AuditAction, AuditEmitter, AuditRecord};
use crate::error::{Result, StaffgateError};
use crate::session::{SessionConfig, SessionIdentity, SessionIdentityStore, SessionLocks, SessionToken};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

/// Maximum length for impersonation reason, in characters.
const MAX_REASON_LENGTH: usize = 500;

/// Request to start impersonating an account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartImpersonation {
    pub target_account_id: AccountId,
    /// Why the operator is impersonating, e.g. a support ticket.
    #[serde(default)]
    pub reason: Option<String>,
}

impl StartImpersonation {
    #[must_use]
    pub fn new(target_account_id: impl Into<AccountId>) -> Self {
        Self {
            target_account_id: target_account_id.into(),
            reason: None,
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Owns every change to session identities.
///
/// Each session is either normal or impersonating:
///
/// ```text
///            start_impersonation
///   Normal ───────────────────────▶ Impersonating
///     ▲                                  │
///     └──────────────────────────────────┘
///       stop_impersonation (rotates token)
/// ```
///
/// All operations on one token run one at a time behind a per-token lock.
/// Operations on different tokens share nothing but the sharded store, so
/// one operator's session never observes another's.
#[derive(Clone)]
pub struct ImpersonationController {
    store: Arc<dyn SessionIdentityStore>,
    accounts: Arc<dyn AccountDirectory>,
    resolver: PermissionResolver,
    audit: AuditEmitter,
    locks: SessionLocks,
    config: ImpersonationConfig,
    session_ttl: chrono::Duration,
}

impl ImpersonationController {
    /// Create a controller with default impersonation and session settings.
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionIdentityStore>,
        accounts: Arc<dyn AccountDirectory>,
        resolver: PermissionResolver,
        audit: AuditEmitter,
    ) -> Self {
        Self {
            store,
            accounts,
            resolver,
            audit,
            locks: SessionLocks::new(),
            config: ImpersonationConfig::default(),
            session_ttl: SessionConfig::default().ttl(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ImpersonationConfig) -> Self {
        self.config = config;
        self
    }

    /// Set how long a session lives after login.
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ImpersonationConfig {
        &self.config
    }

    #[must_use]
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    #[must_use]
    pub fn audit(&self) -> &AuditEmitter {
        &self.audit
    }

    /// Whether the backing store and directory report healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.store.is_healthy() && self.accounts.is_healthy()
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Open a normal session for an authenticated account.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` when the account does not exist or is inactive.
    pub async fn open_session(
        &self,
        account_id: &AccountId,
    ) -> Result<(SessionToken, SessionIdentity)> {
        if self.active_account(account_id).await?.is_none() {
            tracing::warn!(
                target: "staffgate.session.rejected",
                account_id = %account_id,
                reason = "account_unavailable",
                "Login rejected: account missing or inactive"
            );
            return Err(StaffgateError::unauthenticated("account unavailable"));
        }

        let token = SessionToken::generate();
        let identity = SessionIdentity::new(account_id.clone(), self.session_ttl);
        self.store.create(&token, identity.clone()).await?;

        tracing::info!(
            target: "staffgate.session.opened",
            session = token.fingerprint(),
            account_id = %account_id,
            expires_at = %identity.expires_at().to_rfc3339(),
            "Session opened"
        );

        Ok((token, identity))
    }

    /// End a session. An active impersonation is stopped and audited first.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` when the token does not resolve to a session.
    pub async fn close_session(&self, token: &SessionToken) -> Result<()> {
        let _lease = self.locks.acquire(token).await;

        let identity = self
            .store
            .get(token)
            .await?
            .ok_or_else(|| StaffgateError::unauthenticated("session not found"))?;
        self.store.destroy(token).await?;

        if identity.is_impersonating() {
            self.audit
                .emit(
                    AuditRecord::new(
                        AuditAction::Stop,
                        identity.original_account_id().clone(),
                        identity.effective_account_id().clone(),
                    )
                    .with_reason(identity.impersonation_reason())
                    .with_detail("logout"),
                )
                .await;
        }

        tracing::info!(
            target: "staffgate.session.closed",
            session = token.fingerprint(),
            account_id = %identity.original_account_id(),
            was_impersonating = identity.is_impersonating(),
            "Session closed"
        );

        Ok(())
    }

    /// Remove expired sessions from the store.
    pub async fn cleanup_expired(&self) -> Result<usize> {
        let removed = self.store.cleanup_expired().await?;
        if removed > 0 {
            tracing::debug!(
                target: "staffgate.session.cleanup",
                removed,
                "Removed expired sessions"
            );
        }
        Ok(removed)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Start impersonating another account. Only valid from a normal session.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated`: no such session
    /// - `Forbidden`: operator lacks impersonation rights or is inactive
    /// - `InvalidState`: already impersonating, or targeting oneself
    /// - `BadRequest`: a reason is required and none was given
    /// - `NotFound`: target missing or inactive, or a super admin while super
    ///   admin targets are not allowed
    pub async fn start_impersonation(
        &self,
        token: &SessionToken,
        request: StartImpersonation,
    ) -> Result<SessionIdentity> {
        let _lease = self.locks.acquire(token).await;
        let identity = self.load(token).await?;

        let operator_id = identity.original_account_id().clone();
        let target_id = request.target_account_id;

        let operator = self.active_account(&operator_id).await?;
        if !operator
            .as_ref()
            .is_some_and(|op| self.resolver.can_impersonate(op))
        {
            return Err(rejected(
                &operator_id,
                &target_id,
                "not_permitted",
                StaffgateError::forbidden("operator may not impersonate"),
            ));
        }

        if identity.is_impersonating() {
            return Err(rejected(
                &operator_id,
                &target_id,
                "already_impersonating",
                StaffgateError::invalid_state("session is already impersonating"),
            ));
        }

        if target_id == operator_id {
            return Err(rejected(
                &operator_id,
                &target_id,
                "self_impersonation",
                StaffgateError::invalid_state("cannot impersonate yourself"),
            ));
        }

        let reason = request
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(|r| truncate_chars(r, MAX_REASON_LENGTH));
        if self.config.require_reason && reason.is_none() {
            return Err(rejected(
                &operator_id,
                &target_id,
                "no_reason_provided",
                StaffgateError::bad_request("a reason is required to impersonate"),
            ));
        }

        let Some(target) = self.active_account(&target_id).await? else {
            return Err(rejected(
                &operator_id,
                &target_id,
                "target_unavailable",
                StaffgateError::not_found("target account not found"),
            ));
        };

        if target.is_super_admin() && !self.config.allow_super_admin_targets {
            return Err(rejected(
                &operator_id,
                &target_id,
                "target_is_super_admin",
                StaffgateError::not_found("target account not found"),
            ));
        }

        let next = identity.begin_impersonation(target_id.clone(), reason, Utc::now());
        self.store
            .replace(token, identity.session_version(), next.clone())
            .await?;

        self.audit
            .emit(
                AuditRecord::new(AuditAction::Start, operator_id.clone(), target_id.clone())
                    .with_reason(next.impersonation_reason()),
            )
            .await;

        tracing::info!(
            target: "staffgate.impersonation.started",
            session = token.fingerprint(),
            operator_id = %operator_id,
            target_id = %target_id,
            target_role = %target.role,
            max_duration_secs = self.config.max_duration_seconds,
            reason = next.impersonation_reason().unwrap_or("none"),
            session_version = next.session_version(),
            "Impersonation started"
        );

        Ok(next)
    }

    /// Stop impersonating and return to the operator's own identity.
    ///
    /// The session moves to a fresh token; the old token stops working.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated`: no such session, or the operator account is gone
    ///   or inactive (the session is ended rather than rotated)
    /// - `InvalidState`: the session is not impersonating
    pub async fn stop_impersonation(
        &self,
        token: &SessionToken,
    ) -> Result<(SessionToken, SessionIdentity)> {
        let _lease = self.locks.acquire(token).await;
        let identity = self.load(token).await?;

        let Some(started_at) = identity.impersonation_started_at() else {
            tracing::warn!(
                target: "staffgate.impersonation.rejected",
                session = token.fingerprint(),
                operator_id = %identity.original_account_id(),
                reason = "not_impersonating",
                "Stop rejected: session is not impersonating"
            );
            return Err(StaffgateError::invalid_state("session is not impersonating"));
        };

        // Never rotate back to an operator who can no longer sign in.
        if self
            .active_account(identity.original_account_id())
            .await?
            .is_none()
        {
            self.store.destroy(token).await?;
            self.audit
                .emit(
                    AuditRecord::new(
                        AuditAction::Stop,
                        identity.original_account_id().clone(),
                        identity.effective_account_id().clone(),
                    )
                    .with_reason(identity.impersonation_reason())
                    .with_detail("operator_unavailable"),
                )
                .await;

            tracing::warn!(
                target: "staffgate.impersonation.stopped",
                session = token.fingerprint(),
                operator_id = %identity.original_account_id(),
                target_id = %identity.effective_account_id(),
                "Operator unavailable; impersonation and session ended"
            );
            return Err(StaffgateError::unauthenticated("original account unavailable"));
        }

        let next = identity.end_impersonation();
        let new_token = SessionToken::generate();
        self.store
            .rotate(token, &new_token, identity.session_version(), next.clone())
            .await?;

        self.audit
            .emit(
                AuditRecord::new(
                    AuditAction::Stop,
                    identity.original_account_id().clone(),
                    identity.effective_account_id().clone(),
                )
                .with_reason(identity.impersonation_reason()),
            )
            .await;

        tracing::info!(
            target: "staffgate.impersonation.stopped",
            session = new_token.fingerprint(),
            operator_id = %identity.original_account_id(),
            target_id = %identity.effective_account_id(),
            duration_secs = (Utc::now() - started_at).num_seconds(),
            session_version = next.session_version(),
            "Impersonation stopped"
        );

        Ok((new_token, next))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current identity record for `token`.
    pub async fn session(&self, token: &SessionToken) -> Result<SessionIdentity> {
        let _lease = self.locks.acquire(token).await;
        self.load(token).await
    }

    /// Current identity with its accounts and effective permissions.
    pub async fn resolve_session(&self, token: &SessionToken) -> Result<ResolvedSession> {
        let _lease = self.locks.acquire(token).await;
        let identity = self.load(token).await?;
        self.resolve(identity).await
    }

    /// The account whose permissions currently govern the session.
    pub async fn effective_account(&self, token: &SessionToken) -> Result<Account> {
        Ok(self.resolve_session(token).await?.effective)
    }

    /// The account that logged in.
    pub async fn original_account(&self, token: &SessionToken) -> Result<Account> {
        let resolved = self.resolve_session(token).await?;
        Ok(match resolved.original {
            Some(original) => original,
            None => resolved.effective,
        })
    }

    pub async fn whoami(&self, token: &SessionToken) -> Result<IdentityView> {
        let resolved = self.resolve_session(token).await?;
        Ok(IdentityView::from(&resolved))
    }

    /// Refuse `action` if the session is impersonating and the action is
    /// blocked. Attempts are audited.
    ///
    /// # Errors
    ///
    /// `Forbidden` for a blocked action; `Unauthenticated` for no session.
    pub async fn guard_action(&self, token: &SessionToken, action: &str) -> Result<()> {
        let _lease = self.locks.acquire(token).await;
        let identity = self.load(token).await?;

        if !identity.is_impersonating() || !self.config.is_blocked(action) {
            return Ok(());
        }

        self.audit
            .emit(
                AuditRecord::new(
                    AuditAction::Blocked,
                    identity.original_account_id().clone(),
                    identity.effective_account_id().clone(),
                )
                .with_reason(identity.impersonation_reason())
                .with_detail(action),
            )
            .await;

        tracing::warn!(
            target: "staffgate.impersonation.blocked",
            session = token.fingerprint(),
            operator_id = %identity.original_account_id(),
            target_id = %identity.effective_account_id(),
            action = %action,
            "Blocked action attempted during impersonation"
        );

        Err(StaffgateError::forbidden(format!(
            "action '{}' is not allowed during impersonation",
            action
        )))
    }

    // =========================================================================
    // Internals (callers hold the token's lease)
    // =========================================================================

    /// Load a session, ending it if it is inconsistent or its impersonation
    /// has run past the maximum duration.
    async fn load(&self, token: &SessionToken) -> Result<SessionIdentity> {
        let identity = self
            .store
            .get(token)
            .await?
            .ok_or_else(|| StaffgateError::unauthenticated("session not found"))?;

        if !identity.is_consistent() {
            self.store.destroy(token).await?;
            tracing::error!(
                target: "staffgate.session.inconsistent",
                session = token.fingerprint(),
                original_account_id = %identity.original_account_id(),
                effective_account_id = %identity.effective_account_id(),
                "Session identity is inconsistent; session destroyed"
            );
            return Err(StaffgateError::unauthenticated("session invalid"));
        }

        if let Some(started_at) = identity.impersonation_started_at() {
            if Utc::now() - started_at >= self.config.max_duration_chrono() {
                self.store.destroy(token).await?;
                self.audit
                    .emit(
                        AuditRecord::new(
                            AuditAction::Expired,
                            identity.original_account_id().clone(),
                            identity.effective_account_id().clone(),
                        )
                        .with_reason(identity.impersonation_reason()),
                    )
                    .await;

                tracing::info!(
                    target: "staffgate.impersonation.expired",
                    session = token.fingerprint(),
                    operator_id = %identity.original_account_id(),
                    target_id = %identity.effective_account_id(),
                    "Impersonation expired; session ended"
                );
                return Err(StaffgateError::unauthenticated("impersonation expired"));
            }
        }

        Ok(identity)
    }

    async fn resolve(&self, identity: SessionIdentity) -> Result<ResolvedSession> {
        let effective = self
            .active_account(identity.effective_account_id())
            .await?
            .ok_or_else(|| StaffgateError::unauthenticated("effective account unavailable"))?;

        let original = if identity.is_impersonating() {
            Some(
                self.active_account(identity.original_account_id())
                    .await?
                    .ok_or_else(|| {
                        StaffgateError::unauthenticated("original account unavailable")
                    })?,
            )
        } else {
            None
        };

        let permissions = self.resolver.resolve(&effective);
        let facility_scope = self.resolver.facility_scope(&effective);

        Ok(ResolvedSession {
            identity,
            effective,
            original,
            permissions,
            facility_scope,
        })
    }

    async fn active_account(&self, id: &AccountId) -> Result<Option<Account>> {
        Ok(self.accounts.find(id).await?.filter(|a| a.active))
    }
}

fn rejected(
    operator_id: &AccountId,
    target_id: &AccountId,
    reason: &'static str,
    err: StaffgateError,
) -> StaffgateError {
    tracing::warn!(
        target: "staffgate.impersonation.rejected",
        operator_id = %operator_id,
        target_id = %target_id,
        reason,
        "Impersonation rejected"
    );
    err
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => s[..end].to_string(),
        None => s.to_string(),
    }
}
