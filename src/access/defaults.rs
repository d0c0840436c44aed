//! The role → default permissions table.

use super::permission::*;
use super::role::Role;
use crate::error::{Result, StaffgateError};
use std::collections::HashMap;

/// Immutable mapping from role to the permissions it grants by default.
///
/// Built once at startup and shared behind an `Arc`. There is no way to
/// mutate a table after [`RoleDefaultsBuilder::build`]; changing defaults
/// means building a new table and restarting.
#[derive(Clone, Debug)]
pub struct RoleDefaults {
    table: HashMap<Role, PermissionSet>,
    every_permission: PermissionSet,
    version: Option<String>,
}

impl RoleDefaults {
    #[must_use]
    pub fn builder() -> RoleDefaultsBuilder {
        RoleDefaultsBuilder::default()
    }

    /// The built-in table for a staffing deployment.
    #[must_use]
    pub fn standard() -> Self {
        let builder = Self::builder()
            .version("standard")
            .grant(
                Role::SuperAdmin,
                [IMPERSONATE_ACCOUNTS, MANAGE_USERS, VIEW_AUDIT_LOG],
            )
            .grant(
                Role::FacilityAdmin,
                [
                    VIEW_DASHBOARD,
                    VIEW_SCHEDULES,
                    MANAGE_SCHEDULES,
                    VIEW_SHIFTS,
                    MANAGE_SHIFTS,
                    VIEW_STAFF,
                    MANAGE_STAFF,
                    VIEW_TIMESHEETS,
                    APPROVE_TIMESHEETS,
                    VIEW_FACILITIES,
                    MANAGE_FACILITIES,
                    VIEW_INVOICES,
                    VIEW_BILLING,
                    VIEW_REPORTS,
                    SEND_MESSAGES,
                ],
            )
            .grant(
                Role::SchedulingCoordinator,
                [
                    VIEW_DASHBOARD,
                    VIEW_SCHEDULES,
                    MANAGE_SCHEDULES,
                    VIEW_SHIFTS,
                    MANAGE_SHIFTS,
                    VIEW_STAFF,
                    SEND_MESSAGES,
                ],
            )
            .grant(
                Role::HrManager,
                [
                    VIEW_DASHBOARD,
                    VIEW_STAFF,
                    MANAGE_STAFF,
                    VIEW_TIMESHEETS,
                    VIEW_REPORTS,
                    SEND_MESSAGES,
                ],
            )
            .grant(
                Role::Billing,
                [
                    VIEW_DASHBOARD,
                    VIEW_INVOICES,
                    VIEW_BILLING,
                    MANAGE_BILLING,
                    VIEW_TIMESHEETS,
                    VIEW_REPORTS,
                ],
            )
            .grant(
                Role::Supervisor,
                [
                    VIEW_DASHBOARD,
                    VIEW_SCHEDULES,
                    VIEW_SHIFTS,
                    MANAGE_SHIFTS,
                    VIEW_STAFF,
                    VIEW_TIMESHEETS,
                    APPROVE_TIMESHEETS,
                    SEND_MESSAGES,
                ],
            )
            .grant(Role::Staff, [VIEW_DASHBOARD, VIEW_SCHEDULES, VIEW_SHIFTS])
            .grant(
                Role::Viewer,
                [VIEW_DASHBOARD, VIEW_SCHEDULES, VIEW_SHIFTS, VIEW_REPORTS],
            );

        // Static table above only uses known roles and needs no catalog.
        builder.build().expect("standard role table is valid")
    }

    /// Default permissions for `role`; `None` when the table has no entry.
    #[must_use]
    pub fn permissions_for(&self, role: Role) -> Option<&PermissionSet> {
        self.table.get(&role)
    }

    /// Every permission registered anywhere in the table, plus the declared
    /// catalog when one was supplied.
    #[must_use]
    pub fn all_permissions(&self) -> &PermissionSet {
        &self.every_permission
    }

    /// Roles with an entry in the table.
    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.table.keys().copied()
    }

    /// Version label of the configuration this table came from.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

/// Builder for [`RoleDefaults`].
#[derive(Debug, Default)]
#[must_use = "builder does nothing until you call build()"]
pub struct RoleDefaultsBuilder {
    table: HashMap<Role, PermissionSet>,
    catalog: Option<PermissionSet>,
    version: Option<String>,
}

impl RoleDefaultsBuilder {
    /// Add default permissions for a role. Repeated grants accumulate.
    pub fn grant<I, P>(mut self, role: Role, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        let entry = self.table.entry(role).or_default();
        for permission in permissions {
            entry.insert(permission);
        }
        self
    }

    /// Declare the closed set of valid permissions.
    ///
    /// When set, every granted permission must belong to the catalog.
    pub fn catalog<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        self.catalog = Some(permissions.into_iter().collect());
        self
    }

    /// Label the table with a configuration version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Validate and freeze the table.
    ///
    /// # Errors
    ///
    /// Returns [`StaffgateError::Config`] when a granted permission is
    /// missing from a declared catalog.
    pub fn build(self) -> Result<RoleDefaults> {
        let mut every_permission = PermissionSet::new();
        for permissions in self.table.values() {
            every_permission.extend_from(permissions);
        }

        if let Some(catalog) = &self.catalog {
            let mut roles: Vec<_> = self.table.iter().collect();
            roles.sort_by_key(|(role, _)| **role);
            for (role, permissions) in roles {
                if let Some(unknown) = permissions.iter().find(|p| !catalog.contains(p.as_str())) {
                    return Err(StaffgateError::config(format!(
                        "role '{}' grants '{}', which is not in the permission catalog",
                        role, unknown
                    )));
                }
            }
            every_permission.extend_from(catalog);
        }

        Ok(RoleDefaults {
            table: self.table,
            every_permission,
            version: self.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_covers_every_role() {
        let defaults = RoleDefaults::standard();
        for role in Role::ALL {
            assert!(defaults.permissions_for(role).is_some(), "missing {role}");
        }
        assert_eq!(defaults.version(), Some("standard"));
    }

    #[test]
    fn test_all_permissions_is_union() {
        let defaults = RoleDefaults::builder()
            .grant(Role::Viewer, [VIEW_SCHEDULES])
            .grant(Role::Billing, [MANAGE_BILLING, VIEW_INVOICES])
            .build()
            .unwrap();

        let all = defaults.all_permissions();
        assert_eq!(all.len(), 3);
        assert!(all.contains(VIEW_SCHEDULES));
        assert!(all.contains(MANAGE_BILLING));
        assert!(all.contains(VIEW_INVOICES));
    }

    #[test]
    fn test_grants_accumulate() {
        let defaults = RoleDefaults::builder()
            .grant(Role::Staff, [VIEW_SHIFTS])
            .grant(Role::Staff, [VIEW_SCHEDULES])
            .build()
            .unwrap();
        assert_eq!(defaults.permissions_for(Role::Staff).unwrap().len(), 2);
    }

    #[test]
    fn test_catalog_rejects_unknown_permission() {
        let err = RoleDefaults::builder()
            .catalog([VIEW_SCHEDULES])
            .grant(Role::Viewer, [VIEW_SCHEDULES, "view_schedulez"])
            .build()
            .unwrap_err();
        assert!(matches!(err, StaffgateError::Config(_)));
        assert!(err.to_string().contains("view_schedulez"));
    }

    #[test]
    fn test_catalog_joins_all_permissions() {
        let defaults = RoleDefaults::builder()
            .catalog([VIEW_SCHEDULES, IMPERSONATE_ACCOUNTS])
            .grant(Role::Viewer, [VIEW_SCHEDULES])
            .build()
            .unwrap();
        assert!(defaults.all_permissions().contains(IMPERSONATE_ACCOUNTS));
    }
}
