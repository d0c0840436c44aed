//! The closed role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles an account can hold.
///
/// The set is closed: adding a role requires a release. Account records
/// store the role as a raw string and it is parsed at resolution time, so an
/// account carrying a name outside this list resolves to no permissions.
///
/// # Example
///
/// ```rust
/// use staffgate::access::Role;
///
/// let role: Role = "scheduling_coordinator".parse().unwrap();
/// assert_eq!(role, Role::SchedulingCoordinator);
/// assert!(Role::SuperAdmin.is_super_admin());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform staff with every permission.
    SuperAdmin,
    /// Administrator of a single facility.
    FacilityAdmin,
    /// Builds schedules and fills shifts.
    SchedulingCoordinator,
    /// Manages staff records and onboarding.
    HrManager,
    /// Handles invoices and payments.
    Billing,
    /// Oversees shifts and approves timesheets.
    Supervisor,
    /// Scheduled worker.
    Staff,
    /// Read-only access.
    Viewer,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 8] = [
        Role::SuperAdmin,
        Role::FacilityAdmin,
        Role::SchedulingCoordinator,
        Role::HrManager,
        Role::Billing,
        Role::Supervisor,
        Role::Staff,
        Role::Viewer,
    ];

    /// Get the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::FacilityAdmin => "facility_admin",
            Self::SchedulingCoordinator => "scheduling_coordinator",
            Self::HrManager => "hr_manager",
            Self::Billing => "billing",
            Self::Supervisor => "supervisor",
            Self::Staff => "staff",
            Self::Viewer => "viewer",
        }
    }

    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }
}

/// Error returned when parsing a role string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    invalid_value: String,
}

impl ParseRoleError {
    /// The rejected input.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.invalid_value
    }
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized role: '{}'", self.invalid_value)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| ParseRoleError {
                invalid_value: s.to_string(),
            })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
