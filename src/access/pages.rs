//! Page-access policy: which permissions unlock which pages.

use super::permission::*;
use crate::error::{Result, StaffgateError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a page's required permissions are matched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Any one of the required permissions unlocks the page.
    #[default]
    Any,
    /// Every required permission is needed.
    All,
}

/// Whether a page's existence may be disclosed to callers who cannot open it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageVisibility {
    /// Always accessible, no permission needed.
    Public,
    /// Known to every caller; denial is reported as forbidden.
    #[default]
    Listed,
    /// Denial is reported as not found, hiding the page.
    Hidden,
}

/// Access rule for a single page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRule {
    #[serde(default)]
    pub requires: PermissionSet,
    #[serde(default, rename = "match")]
    pub mode: MatchMode,
    #[serde(default)]
    pub visibility: PageVisibility,
}

impl PageRule {
    /// Unlocked by any one of `permissions`.
    pub fn any_of<I, P>(permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        Self {
            requires: permissions.into_iter().collect(),
            mode: MatchMode::Any,
            visibility: PageVisibility::Listed,
        }
    }

    /// Unlocked only by holding all of `permissions`.
    pub fn all_of<I, P>(permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        Self {
            mode: MatchMode::All,
            ..Self::any_of(permissions)
        }
    }

    /// Always accessible.
    #[must_use]
    pub fn public() -> Self {
        Self {
            requires: PermissionSet::new(),
            mode: MatchMode::Any,
            visibility: PageVisibility::Public,
        }
    }

    /// Report denial as not found.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visibility = PageVisibility::Hidden;
        self
    }

    fn allows(&self, permissions: &PermissionSet) -> bool {
        match (self.visibility, self.mode) {
            (PageVisibility::Public, _) => true,
            (_, MatchMode::Any) => permissions.intersects(&self.requires),
            (_, MatchMode::All) => permissions.is_superset_of(&self.requires),
        }
    }
}

/// Immutable registry of page rules.
///
/// Page keys that were never registered are denied.
///
/// # Example
///
/// ```rust
/// use staffgate::access::{PageAccessPolicy, PageRule, PermissionSet};
///
/// let policy = PageAccessPolicy::builder()
///     .page("schedules", PageRule::any_of(["view_schedules", "manage_schedules"]))
///     .page("login", PageRule::public())
///     .build()
///     .unwrap();
///
/// let perms: PermissionSet = ["view_schedules"].into_iter().collect();
/// assert!(policy.can_access(&perms, "schedules"));
/// assert!(policy.can_access(&PermissionSet::new(), "login"));
/// assert!(!policy.can_access(&perms, "payroll"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct PageAccessPolicy {
    pages: BTreeMap<String, PageRule>,
}

impl PageAccessPolicy {
    #[must_use]
    pub fn builder() -> PageAccessPolicyBuilder {
        PageAccessPolicyBuilder::default()
    }

    /// Pages for the built-in role table.
    #[must_use]
    pub fn standard() -> Self {
        let builder = Self::builder()
            .page("login", PageRule::public())
            .page("help", PageRule::public())
            .page("dashboard", PageRule::any_of([VIEW_DASHBOARD]))
            .page(
                "schedules",
                PageRule::any_of([VIEW_SCHEDULES, MANAGE_SCHEDULES]),
            )
            .page("shifts", PageRule::any_of([VIEW_SHIFTS, MANAGE_SHIFTS]))
            .page("staff", PageRule::any_of([VIEW_STAFF, MANAGE_STAFF]))
            .page(
                "timesheets",
                PageRule::any_of([VIEW_TIMESHEETS, APPROVE_TIMESHEETS]),
            )
            .page(
                "facilities",
                PageRule::any_of([VIEW_FACILITIES, MANAGE_FACILITIES]),
            )
            .page("billing", PageRule::any_of([VIEW_BILLING, MANAGE_BILLING]))
            .page("invoices", PageRule::any_of([VIEW_INVOICES, MANAGE_BILLING]))
            .page("reports", PageRule::any_of([VIEW_REPORTS]))
            .page("messages", PageRule::any_of([SEND_MESSAGES]))
            .page(
                "operations_dashboard",
                PageRule::all_of([VIEW_SCHEDULES, VIEW_BILLING]),
            )
            .page("users", PageRule::any_of([MANAGE_USERS]).hidden())
            .page("audit_log", PageRule::any_of([VIEW_AUDIT_LOG]).hidden())
            .page(
                "impersonation",
                PageRule::any_of([IMPERSONATE_ACCOUNTS]).hidden(),
            );

        // Every non-public rule above has requirements.
        builder.build().expect("standard page registry is valid")
    }

    /// Whether `permissions` unlock `page_key`.
    #[must_use]
    pub fn can_access(&self, permissions: &PermissionSet, page_key: &str) -> bool {
        self.pages
            .get(page_key)
            .is_some_and(|rule| rule.allows(permissions))
    }

    /// Like [`can_access`](Self::can_access), but reports denial as an error.
    ///
    /// # Errors
    ///
    /// - [`StaffgateError::NotFound`] for unknown pages and denied hidden pages
    /// - [`StaffgateError::Forbidden`] for denied listed pages
    pub fn authorize(&self, permissions: &PermissionSet, page_key: &str) -> Result<()> {
        let Some(rule) = self.pages.get(page_key) else {
            return Err(StaffgateError::not_found(format!(
                "page '{}' is not registered",
                page_key
            )));
        };

        if rule.allows(permissions) {
            return Ok(());
        }

        match rule.visibility {
            PageVisibility::Hidden => Err(StaffgateError::not_found(format!(
                "page '{}' is hidden from this caller",
                page_key
            ))),
            _ => Err(StaffgateError::forbidden(format!(
                "missing permissions for page '{}'",
                page_key
            ))),
        }
    }

    /// Page keys `permissions` unlock, in key order.
    #[must_use]
    pub fn visible_pages(&self, permissions: &PermissionSet) -> Vec<&str> {
        self.pages
            .iter()
            .filter(|(_, rule)| rule.allows(permissions))
            .map(|(key, _)| key.as_str())
            .collect()
    }

    #[must_use]
    pub fn rule(&self, page_key: &str) -> Option<&PageRule> {
        self.pages.get(page_key)
    }

    pub fn page_keys(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    /// Every permission referenced by any page.
    #[must_use]
    pub fn referenced_permissions(&self) -> PermissionSet {
        let mut all = PermissionSet::new();
        for rule in self.pages.values() {
            all.extend_from(&rule.requires);
        }
        all
    }
}

/// Builder for [`PageAccessPolicy`].
#[derive(Debug, Default)]
#[must_use = "builder does nothing until you call build()"]
pub struct PageAccessPolicyBuilder {
    pages: Vec<(String, PageRule)>,
}

impl PageAccessPolicyBuilder {
    /// Register a page. A later registration of the same key is an error.
    pub fn page(mut self, key: impl Into<String>, rule: PageRule) -> Self {
        self.pages.push((key.into(), rule));
        self
    }

    /// Validate and freeze the registry.
    ///
    /// # Errors
    ///
    /// Returns [`StaffgateError::Config`] for an empty key, a duplicate key,
    /// or a non-public page that requires nothing.
    pub fn build(self) -> Result<PageAccessPolicy> {
        let mut pages = BTreeMap::new();
        for (key, rule) in self.pages {
            if key.trim().is_empty() {
                return Err(StaffgateError::config("page key must not be empty"));
            }
            if rule.visibility != PageVisibility::Public && rule.requires.is_empty() {
                return Err(StaffgateError::config(format!(
                    "page '{}' has no required permissions; mark it public or list some",
                    key
                )));
            }
            if pages.contains_key(&key) {
                return Err(StaffgateError::config(format!(
                    "page '{}' is registered twice",
                    key
                )));
            }
            pages.insert(key, rule);
        }
        Ok(PageAccessPolicy { pages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perms(tokens: &[&str]) -> PermissionSet {
        tokens.iter().copied().collect()
    }

    #[test]
    fn test_standard_registry_uses_granted_permissions() {
        let policy = PageAccessPolicy::standard();
        let granted = crate::access::RoleDefaults::standard();
        assert!(policy.page_keys().count() > 0);
        assert!(
            granted
                .all_permissions()
                .is_superset_of(&policy.referenced_permissions())
        );
    }

    #[test]
    fn test_any_of() {
        let policy = PageAccessPolicy::standard();
        assert!(policy.can_access(&perms(&[MANAGE_SCHEDULES]), "schedules"));
        assert!(policy.can_access(&perms(&[VIEW_SCHEDULES]), "schedules"));
        assert!(!policy.can_access(&perms(&[VIEW_SHIFTS]), "schedules"));
    }

    #[test]
    fn test_all_of() {
        let policy = PageAccessPolicy::standard();
        assert!(!policy.can_access(&perms(&[VIEW_SCHEDULES]), "operations_dashboard"));
        assert!(policy.can_access(
            &perms(&[VIEW_SCHEDULES, VIEW_BILLING]),
            "operations_dashboard"
        ));
    }

    #[test]
    fn test_unknown_page_denied() {
        let policy = PageAccessPolicy::standard();
        let everything = perms(&[
            VIEW_DASHBOARD,
            MANAGE_USERS,
            IMPERSONATE_ACCOUNTS,
            MANAGE_BILLING,
        ]);
        assert!(!policy.can_access(&everything, "payroll"));
        assert!(matches!(
            policy.authorize(&everything, "payroll"),
            Err(StaffgateError::NotFound(_))
        ));
    }

    #[test]
    fn test_public_page_allows_empty_set() {
        let policy = PageAccessPolicy::standard();
        assert!(policy.can_access(&PermissionSet::new(), "login"));
        assert!(policy.authorize(&PermissionSet::new(), "help").is_ok());
    }

    #[test]
    fn test_authorize_disclosure() {
        let policy = PageAccessPolicy::standard();
        let viewer = perms(&[VIEW_DASHBOARD, VIEW_SCHEDULES]);

        assert!(policy.authorize(&viewer, "dashboard").is_ok());
        assert!(matches!(
            policy.authorize(&viewer, "billing"),
            Err(StaffgateError::Forbidden(_))
        ));
        assert!(matches!(
            policy.authorize(&viewer, "audit_log"),
            Err(StaffgateError::NotFound(_))
        ));
    }

    #[test]
    fn test_visible_pages() {
        let policy = PageAccessPolicy::standard();
        let visible = policy.visible_pages(&perms(&[VIEW_DASHBOARD, VIEW_REPORTS]));
        assert_eq!(visible, vec!["dashboard", "help", "login", "reports"]);
    }

    #[test]
    fn test_rejects_page_without_requirements() {
        let err = PageAccessPolicy::builder()
            .page("orphan", PageRule::any_of(Vec::<Permission>::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, StaffgateError::Config(_)));
    }

    #[test]
    fn test_rejects_duplicate_page() {
        let err = PageAccessPolicy::builder()
            .page("reports", PageRule::any_of([VIEW_REPORTS]))
            .page("reports", PageRule::public())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("registered twice"));
    }

    #[test]
    fn test_rule_deserializes_with_defaults() {
        let rule: PageRule = serde_json::from_str(r#"{"requires":["view_reports"]}"#).unwrap();
        assert_eq!(rule.mode, MatchMode::Any);
        assert_eq!(rule.visibility, PageVisibility::Listed);

        let rule: PageRule =
            serde_json::from_str(r#"{"requires":["a","b"],"match":"all","visibility":"hidden"}"#)
                .unwrap();
        assert_eq!(rule, PageRule::all_of(["a", "b"]).hidden());
    }
}
