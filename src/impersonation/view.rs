use crate::access::{FacilityScope, PageAccessPolicy, PermissionSet};
use crate::accounts::{Account, AccountId};
use crate::session::SessionIdentity;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A session resolved down to its effective account and permissions.
#[derive(Clone, Debug)]
pub struct ResolvedSession {
    pub identity: SessionIdentity,
    pub effective: Account,
    /// Present only while impersonating.
    pub original: Option<Account>,
    pub permissions: PermissionSet,
    pub facility_scope: FacilityScope,
}

impl ResolvedSession {
    #[must_use]
    pub fn is_impersonating(&self) -> bool {
        self.identity.is_impersonating()
    }
}

/// What a client sees of its own session.
///
/// Always computed from the current server-side record; clients re-fetch it
/// after every transition instead of patching local state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
    pub account_id: AccountId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: String,
    pub effective_permissions: Vec<String>,
    pub is_impersonating: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_account_id: Option<AccountId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impersonation_started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impersonation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_id: Option<String>,
    pub facility_scope: FacilityScope,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub visible_pages: Vec<String>,
    pub session_version: u64,
}

impl IdentityView {
    /// Attach the pages the effective permissions unlock.
    #[must_use]
    pub fn with_visible_pages(mut self, policy: &PageAccessPolicy, permissions: &PermissionSet) -> Self {
        self.visible_pages = policy
            .visible_pages(permissions)
            .into_iter()
            .map(str::to_string)
            .collect();
        self
    }
}

impl From<&ResolvedSession> for IdentityView {
    fn from(resolved: &ResolvedSession) -> Self {
        let identity = &resolved.identity;
        Self {
            account_id: resolved.effective.id.clone(),
            email: resolved.effective.email.clone(),
            role: resolved.effective.role.clone(),
            effective_permissions: resolved.permissions.to_strings(),
            is_impersonating: identity.is_impersonating(),
            original_account_id: identity
                .is_impersonating()
                .then(|| identity.original_account_id().clone()),
            original_email: resolved.original.as_ref().and_then(|a| a.email.clone()),
            impersonation_started_at: identity.impersonation_started_at(),
            impersonation_reason: identity.impersonation_reason().map(str::to_string),
            facility_id: resolved.effective.facility_id.clone(),
            facility_scope: resolved.facility_scope.clone(),
            visible_pages: Vec::new(),
            session_version: identity.session_version(),
        }
    }
}
