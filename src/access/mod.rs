//! Roles, permissions and page access.
//!
//! Everything here is immutable once built and free of I/O, so checks can
//! run on every request without locking.
//!
//! - [`RoleDefaults`]: role → default permission set
//! - [`PermissionResolver`]: an account's effective permission set
//! - [`PageAccessPolicy`]: page key → required permissions
//! - [`AccessConfig`]: loads the role table and page registry from JSON

mod config;
mod defaults;
mod pages;
mod permission;
mod resolver;
mod role;

pub use config::{AccessConfig, AccessTables};
pub use defaults::{RoleDefaults, RoleDefaultsBuilder};
pub use pages::{MatchMode, PageAccessPolicy, PageAccessPolicyBuilder, PageRule, PageVisibility};
pub use permission::*;
pub use resolver::{FacilityScope, PermissionResolver};
pub use role::{ParseRoleError, Role};
