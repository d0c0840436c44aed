//! Permission tokens and permission sets.
//!
//! A [`Permission`] is an opaque, atomic string token. There is no hierarchy
//! and no implication between permissions; only the super-admin role is
//! treated specially (see [`PermissionResolver`](super::PermissionResolver)).

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// Well-known permissions
// =============================================================================

/// View the landing dashboard.
pub const VIEW_DASHBOARD: &str = "view_dashboard";
/// View published schedules.
pub const VIEW_SCHEDULES: &str = "view_schedules";
/// Create and edit schedules.
pub const MANAGE_SCHEDULES: &str = "manage_schedules";
/// View open and assigned shifts.
pub const VIEW_SHIFTS: &str = "view_shifts";
/// Create, assign and cancel shifts.
pub const MANAGE_SHIFTS: &str = "manage_shifts";
/// View staff records.
pub const VIEW_STAFF: &str = "view_staff";
/// Onboard, edit and offboard staff.
pub const MANAGE_STAFF: &str = "manage_staff";
/// View timesheets.
pub const VIEW_TIMESHEETS: &str = "view_timesheets";
/// Approve submitted timesheets.
pub const APPROVE_TIMESHEETS: &str = "approve_timesheets";
/// View facility profiles.
pub const VIEW_FACILITIES: &str = "view_facilities";
/// Edit facility profiles and settings.
pub const MANAGE_FACILITIES: &str = "manage_facilities";
/// View invoices.
pub const VIEW_INVOICES: &str = "view_invoices";
/// View billing summaries.
pub const VIEW_BILLING: &str = "view_billing";
/// Edit billing details, rates and payment settings.
pub const MANAGE_BILLING: &str = "manage_billing";
/// View reports.
pub const VIEW_REPORTS: &str = "view_reports";
/// Send messages to staff.
pub const SEND_MESSAGES: &str = "send_messages";
/// Administer platform accounts.
pub const MANAGE_USERS: &str = "manage_users";
/// Read the impersonation audit trail.
pub const VIEW_AUDIT_LOG: &str = "view_audit_log";
/// Operate as another account.
pub const IMPERSONATE_ACCOUNTS: &str = "impersonate_accounts";

/// An opaque permission token such as `view_schedules`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    /// Create a permission from its token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<String> for Permission {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl Borrow<str> for Permission {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// An ordered set of permissions.
///
/// Serializes as a sorted JSON array of tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a permission, returning whether it was newly inserted.
    pub fn insert(&mut self, permission: impl Into<Permission>) -> bool {
        self.0.insert(permission.into())
    }

    /// Check whether the set holds `permission`.
    #[must_use]
    pub fn contains(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    /// True when at least one permission is shared with `other`.
    #[must_use]
    pub fn intersects(&self, other: &PermissionSet) -> bool {
        // Iterate the smaller side.
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().any(|p| large.0.contains(p))
    }

    /// True when every permission in `other` is also in this set.
    #[must_use]
    pub fn is_superset_of(&self, other: &PermissionSet) -> bool {
        self.0.is_superset(&other.0)
    }

    /// Union of both sets.
    #[must_use]
    pub fn union(&self, other: &PermissionSet) -> PermissionSet {
        Self(self.0.union(&other.0).cloned().collect())
    }

    /// Add every permission from `other`.
    pub fn extend_from(&mut self, other: &PermissionSet) {
        self.0.extend(other.0.iter().cloned());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    /// Tokens as plain strings, in sorted order.
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|p| p.as_str().to_string()).collect()
    }
}

impl<P: Into<Permission>> FromIterator<P> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for PermissionSet {
    type Item = Permission;
    type IntoIter = std::collections::btree_set::IntoIter<Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a Permission;
    type IntoIter = std::collections::btree_set::Iter<'a, Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_by_str() {
        let set: PermissionSet = [VIEW_SCHEDULES, VIEW_SHIFTS].into_iter().collect();
        assert!(set.contains(VIEW_SCHEDULES));
        assert!(!set.contains(MANAGE_BILLING));
    }

    #[test]
    fn test_intersects() {
        let a: PermissionSet = [VIEW_SCHEDULES, VIEW_SHIFTS].into_iter().collect();
        let b: PermissionSet = [VIEW_SHIFTS, MANAGE_BILLING].into_iter().collect();
        let c: PermissionSet = [MANAGE_BILLING].into_iter().collect();

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(!a.intersects(&PermissionSet::new()));
    }

    #[test]
    fn test_superset() {
        let a: PermissionSet = [VIEW_SCHEDULES, VIEW_BILLING, VIEW_SHIFTS].into_iter().collect();
        let b: PermissionSet = [VIEW_SCHEDULES, VIEW_BILLING].into_iter().collect();

        assert!(a.is_superset_of(&b));
        assert!(!b.is_superset_of(&a));
        assert!(a.is_superset_of(&PermissionSet::new()));
    }

    #[test]
    fn test_serializes_as_sorted_array() {
        let set: PermissionSet = [VIEW_SHIFTS, MANAGE_BILLING].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["manage_billing","view_shifts"]"#);
    }
}
