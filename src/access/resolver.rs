//! Effective permission resolution.

use super::defaults::RoleDefaults;
use super::permission::{IMPERSONATE_ACCOUNTS, PermissionSet};
use super::role::Role;
use crate::accounts::Account;
use serde::Serialize;
use std::sync::Arc;

/// Which facilities an account's data access is scoped to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "facilityId", rename_all = "snake_case")]
pub enum FacilityScope {
    /// Every facility. Super admins only.
    All,
    /// A single facility.
    Only(String),
    /// No facility affiliation; facility-scoped data is hidden.
    Unassigned,
}

/// Computes the permission set an account holds.
///
/// Resolution is pure: no I/O and no locking, so it runs on every request.
/// Rules, first match wins:
///
/// 1. `super_admin` gets every permission known to the role table.
/// 2. A non-empty explicit permission list is used as-is, replacing the role
///    defaults entirely.
/// 3. Otherwise the role defaults; an unrecognized role gets nothing.
///
/// # Example
///
/// ```rust
/// use staffgate::access::{PermissionResolver, RoleDefaults, MANAGE_BILLING};
/// use staffgate::accounts::Account;
///
/// let resolver = PermissionResolver::new(RoleDefaults::standard().into());
///
/// let billing = Account::new("7", "billing");
/// assert!(resolver.resolve(&billing).contains(MANAGE_BILLING));
///
/// let unknown = Account::new("8", "owner");
/// assert!(resolver.resolve(&unknown).is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct PermissionResolver {
    defaults: Arc<RoleDefaults>,
}

impl PermissionResolver {
    #[must_use]
    pub fn new(defaults: Arc<RoleDefaults>) -> Self {
        Self { defaults }
    }

    /// The role table this resolver reads.
    #[must_use]
    pub fn defaults(&self) -> &RoleDefaults {
        &self.defaults
    }

    /// Effective permissions for `account`.
    #[must_use]
    pub fn resolve(&self, account: &Account) -> PermissionSet {
        let role = account.role();

        if role.is_some_and(|r| r.is_super_admin()) {
            return self.defaults.all_permissions().clone();
        }

        if !account.permissions.is_empty() {
            return account.permissions.iter().cloned().collect();
        }

        match role {
            Some(role) => self
                .defaults
                .permissions_for(role)
                .cloned()
                .unwrap_or_default(),
            None => {
                tracing::warn!(
                    target: "staffgate.access.unknown_role",
                    account_id = %account.id,
                    role = %account.role,
                    "Account has an unrecognized role; resolving to no permissions"
                );
                PermissionSet::new()
            }
        }
    }

    #[must_use]
    pub fn has_permission(&self, account: &Account, permission: &str) -> bool {
        self.resolve(account).contains(permission)
    }

    /// Whether `account` may start impersonation sessions.
    #[must_use]
    pub fn can_impersonate(&self, account: &Account) -> bool {
        account.is_super_admin() || self.has_permission(account, IMPERSONATE_ACCOUNTS)
    }

    /// Facility scope for `account`, taken from its stored affiliation.
    #[must_use]
    pub fn facility_scope(&self, account: &Account) -> FacilityScope {
        if account.role() == Some(Role::SuperAdmin) {
            return FacilityScope::All;
        }
        match &account.facility_id {
            Some(id) if !id.is_empty() => FacilityScope::Only(id.clone()),
            _ => FacilityScope::Unassigned,
        }
    }
}
