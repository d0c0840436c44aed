//! Static JSON configuration for the role table and page registry.
//!
//! ```json
//! {
//!   "version": "2026-10",
//!   "permissions": ["view_schedules", "manage_schedules", "impersonate_accounts"],
//!   "roles": {
//!     "super_admin": ["impersonate_accounts"],
//!     "scheduling_coordinator": ["view_schedules", "manage_schedules"]
//!   },
//!   "pages": {
//!     "login": { "visibility": "public" },
//!     "schedules": { "requires": ["view_schedules", "manage_schedules"] }
//!   }
//! }
//! ```
//!
//! `permissions` is optional. When present it is the closed catalog every
//! role grant and page requirement must come from.

use super::defaults::RoleDefaults;
use super::pages::{PageAccessPolicy, PageRule};
use super::permission::{Permission, PermissionSet};
use super::role::Role;
use crate::error::{Result, StaffgateError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Raw access configuration as read from disk.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessConfig {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub permissions: Option<Vec<Permission>>,
    #[serde(default)]
    pub roles: BTreeMap<String, Vec<Permission>>,
    #[serde(default)]
    pub pages: BTreeMap<String, PageRule>,
}

/// Validated, immutable access tables shared across the service.
#[derive(Clone, Debug)]
pub struct AccessTables {
    pub roles: Arc<RoleDefaults>,
    pub pages: Arc<PageAccessPolicy>,
}

impl AccessTables {
    /// Built-in role table and page registry.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            roles: Arc::new(RoleDefaults::standard()),
            pages: Arc::new(PageAccessPolicy::standard()),
        }
    }
}

impl AccessConfig {
    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`StaffgateError::Config`] when the file cannot be read or is
    /// not valid configuration JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StaffgateError::config(format!(
                "failed to read access config {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`StaffgateError::Config`] for malformed JSON or unknown fields.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| StaffgateError::config(format!("invalid access config: {}", e)))
    }

    /// Validate and freeze into [`AccessTables`].
    ///
    /// # Errors
    ///
    /// Returns [`StaffgateError::Config`] when a role name is not recognized,
    /// a permission falls outside the declared catalog, or a page rule is
    /// invalid.
    pub fn build(self) -> Result<AccessTables> {
        let mut roles = RoleDefaults::builder();
        if let Some(version) = &self.version {
            roles = roles.version(version.clone());
        }
        if let Some(catalog) = &self.permissions {
            roles = roles.catalog(catalog.iter().cloned());
        }

        for (name, permissions) in self.roles {
            let role: Role = name
                .parse()
                .map_err(|e| StaffgateError::config(format!("access config: {}", e)))?;
            roles = roles.grant(role, permissions);
        }
        let roles = roles.build()?;

        let mut pages = PageAccessPolicy::builder();
        for (key, rule) in self.pages {
            pages = pages.page(key, rule);
        }
        let pages = pages.build()?;

        if let Some(catalog) = &self.permissions {
            let catalog: PermissionSet = catalog.iter().cloned().collect();
            if let Some(unknown) = pages
                .referenced_permissions()
                .iter()
                .find(|p| !catalog.contains(p.as_str()))
            {
                return Err(StaffgateError::config(format!(
                    "a page requires '{}', which is not in the permission catalog",
                    unknown
                )));
            }
        }

        tracing::info!(
            target: "staffgate.access.loaded",
            version = roles.version().unwrap_or("unversioned"),
            roles = roles.roles().count(),
            pages = pages.page_keys().count(),
            permissions = roles.all_permissions().len(),
            "Access tables loaded"
        );

        Ok(AccessTables {
            roles: Arc::new(roles),
            pages: Arc::new(pages),
        })
    }
}
