use crate::access::{Permission, Role};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable account identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A platform account as seen by the permission core.
///
/// `role` is kept as the raw stored name rather than a [`Role`] so that an
/// account written with a role this build does not know still loads, and
/// resolves to nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    #[serde(default)]
    pub email: Option<String>,
    pub role: String,
    /// Explicit grants. When non-empty they replace the role defaults.
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub facility_id: Option<String>,
}

fn default_active() -> bool {
    true
}

impl Account {
    /// Create an active account with no explicit permissions.
    #[must_use]
    pub fn new(id: impl Into<AccountId>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            role: role.into(),
            permissions: Vec::new(),
            active: true,
            facility_id: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set explicit permissions, replacing any set before.
    #[must_use]
    pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_facility(mut self, facility_id: impl Into<String>) -> Self {
        self.facility_id = Some(facility_id.into());
        self
    }

    /// Mark the account as deactivated.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Parsed role, or `None` when the stored name is not a known role.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.role().is_some_and(|r| r.is_super_admin())
    }
}
