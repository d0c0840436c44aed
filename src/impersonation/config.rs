use crate::utils::{get_env_flag, get_env_with_prefix};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default maximum impersonation duration (1 hour).
const DEFAULT_MAX_DURATION_SECONDS: u64 = 60 * 60;

/// Configuration for impersonation behavior.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpersonationConfig {
    /// Maximum duration of an impersonation before it is ended on next use.
    #[serde(default = "default_max_duration_seconds")]
    pub max_duration_seconds: u64,
    /// Require a non-empty reason to start impersonating.
    #[serde(default)]
    pub require_reason: bool,
    /// Whether other super admins can be impersonated.
    #[serde(default)]
    pub allow_super_admin_targets: bool,
    /// Actions refused while impersonating.
    #[serde(default = "default_blocked_actions")]
    pub blocked_actions: Vec<BlockedAction>,
}

impl Default for ImpersonationConfig {
    fn default() -> Self {
        Self {
            max_duration_seconds: DEFAULT_MAX_DURATION_SECONDS,
            require_reason: false,
            allow_super_admin_targets: false,
            blocked_actions: default_blocked_actions(),
        }
    }
}

impl ImpersonationConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a strict config (short sessions, reason required, more actions blocked).
    #[must_use]
    pub fn strict() -> Self {
        Self {
            max_duration_seconds: 30 * 60, // 30 minutes
            require_reason: true,
            allow_super_admin_targets: false,
            blocked_actions: vec![
                BlockedAction::DeleteAccount,
                BlockedAction::ChangePassword,
                BlockedAction::ChangeEmail,
                BlockedAction::ManageCredentials,
                BlockedAction::ModifyBilling,
                BlockedAction::ExportData,
            ],
        }
    }

    /// Create a permissive config (for internal tools).
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            max_duration_seconds: 4 * 60 * 60, // 4 hours
            require_reason: false,
            allow_super_admin_targets: false,
            blocked_actions: vec![BlockedAction::DeleteAccount],
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(seconds) = get_env_with_prefix("IMPERSONATION_MAX_DURATION_SECONDS") {
            match seconds.parse() {
                Ok(seconds) => config.max_duration_seconds = seconds,
                Err(_) => tracing::warn!(
                    value = %seconds,
                    "Ignoring invalid IMPERSONATION_MAX_DURATION_SECONDS"
                ),
            }
        }

        if let Some(require) = get_env_flag("IMPERSONATION_REQUIRE_REASON") {
            config.require_reason = require;
        }

        if let Some(allow) = get_env_flag("IMPERSONATION_ALLOW_SUPER_ADMIN_TARGETS") {
            config.allow_super_admin_targets = allow;
        }

        if let Some(actions) = get_env_with_prefix("IMPERSONATION_BLOCKED_ACTIONS") {
            config.blocked_actions = actions
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(BlockedAction::from)
                .collect();
        }

        config
    }

    /// Set the maximum duration for impersonation.
    #[must_use]
    pub fn max_duration(mut self, duration: Duration) -> Self {
        self.max_duration_seconds = duration.as_secs();
        self
    }

    /// Set whether a reason is required for impersonation.
    #[must_use]
    pub fn require_reason(mut self, require: bool) -> Self {
        self.require_reason = require;
        self
    }

    /// Set whether super admins can be impersonated.
    #[must_use]
    pub fn allow_super_admin_targets(mut self, allow: bool) -> Self {
        self.allow_super_admin_targets = allow;
        self
    }

    /// Set actions blocked during impersonation.
    #[must_use]
    pub fn blocked_actions(mut self, actions: Vec<BlockedAction>) -> Self {
        self.blocked_actions = actions;
        self
    }

    /// Maximum impersonation duration as a chrono duration.
    #[must_use]
    pub fn max_duration_chrono(&self) -> chrono::Duration {
        let seconds = i64::try_from(self.max_duration_seconds).unwrap_or(i64::MAX);
        chrono::Duration::seconds(seconds.min(crate::session::MAX_TTL_SECONDS))
    }

    /// Check if `action` is blocked during impersonation.
    #[must_use]
    pub fn is_blocked(&self, action: &str) -> bool {
        self.blocked_actions.iter().any(|b| b.matches(action))
    }
}

fn default_max_duration_seconds() -> u64 {
    DEFAULT_MAX_DURATION_SECONDS
}

fn default_blocked_actions() -> Vec<BlockedAction> {
    vec![
        BlockedAction::DeleteAccount,
        BlockedAction::ChangePassword,
        BlockedAction::ChangeEmail,
        BlockedAction::ManageCredentials,
    ]
}

/// Actions that can be blocked during impersonation.
///
/// Serialized as its snake_case name; any other string is a custom action.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockedAction {
    /// Deleting the account.
    DeleteAccount,
    /// Changing the account's password.
    ChangePassword,
    /// Changing the account's email.
    ChangeEmail,
    /// Adding or removing MFA factors, API keys and similar credentials.
    ManageCredentials,
    /// Modifying billing/payment info.
    ModifyBilling,
    /// Exporting account data.
    ExportData,
    /// Sending messages as the account.
    SendMessages,
    /// Custom blocked action.
    Custom(String),
}

impl BlockedAction {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::DeleteAccount => "delete_account",
            Self::ChangePassword => "change_password",
            Self::ChangeEmail => "change_email",
            Self::ManageCredentials => "manage_credentials",
            Self::ModifyBilling => "modify_billing",
            Self::ExportData => "export_data",
            Self::SendMessages => "send_messages",
            Self::Custom(s) => s,
        }
    }

    /// Check if an action string matches this blocked action.
    #[must_use]
    pub fn matches(&self, action: &str) -> bool {
        self.as_str() == action
    }
}

impl From<&str> for BlockedAction {
    fn from(s: &str) -> Self {
        match s {
            "delete_account" => Self::DeleteAccount,
            "change_password" => Self::ChangePassword,
            "change_email" => Self::ChangeEmail,
            "manage_credentials" => Self::ManageCredentials,
            "modify_billing" => Self::ModifyBilling,
            "export_data" => Self::ExportData,
            "send_messages" => Self::SendMessages,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for BlockedAction {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<BlockedAction> for String {
    fn from(action: BlockedAction) -> Self {
        action.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImpersonationConfig::default();
        assert_eq!(config.max_duration_seconds, 3600);
        assert!(!config.require_reason);
        assert!(!config.allow_super_admin_targets);
        assert!(config.is_blocked("delete_account"));
        assert!(config.is_blocked("change_password"));
        assert!(!config.is_blocked("view_schedules"));
    }

    #[test]
    fn test_presets() {
        let strict = ImpersonationConfig::strict();
        assert!(strict.require_reason);
        assert!(strict.is_blocked("export_data"));
        assert_eq!(strict.max_duration_seconds, 1800);

        let permissive = ImpersonationConfig::permissive();
        assert!(!permissive.is_blocked("change_password"));
        assert!(permissive.is_blocked("delete_account"));
    }

    #[test]
    fn test_builder_methods() {
        let config = ImpersonationConfig::new()
            .max_duration(Duration::from_secs(600))
            .require_reason(true)
            .allow_super_admin_targets(true)
            .blocked_actions(vec![BlockedAction::Custom("approve_payroll".into())]);

        assert_eq!(config.max_duration_chrono(), chrono::Duration::minutes(10));
        assert!(config.require_reason);
        assert!(config.allow_super_admin_targets);
        assert!(config.is_blocked("approve_payroll"));
        assert!(!config.is_blocked("delete_account"));
    }

    #[test]
    fn test_blocked_action_serde() {
        let actions: Vec<BlockedAction> =
            serde_json::from_str(r#"["change_email", "approve_payroll"]"#).unwrap();
        assert_eq!(
            actions,
            vec![
                BlockedAction::ChangeEmail,
                BlockedAction::Custom("approve_payroll".into())
            ]
        );
        assert_eq!(
            serde_json::to_string(&actions).unwrap(),
            r#"["change_email","approve_payroll"]"#
        );
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ImpersonationConfig =
            serde_json::from_str(r#"{"require_reason": true}"#).unwrap();
        assert!(config.require_reason);
        assert_eq!(config.max_duration_seconds, 3600);
        assert_eq!(config.blocked_actions.len(), 4);
    }

    #[test]
    fn test_from_env() {
        unsafe {
            std::env::set_var("STAFFGATE_IMPERSONATION_MAX_DURATION_SECONDS", "120");
            std::env::set_var("STAFFGATE_IMPERSONATION_REQUIRE_REASON", "yes");
            std::env::set_var(
                "STAFFGATE_IMPERSONATION_BLOCKED_ACTIONS",
                "delete_account, approve_payroll",
            );
        }

        let config = ImpersonationConfig::from_env();
        assert_eq!(config.max_duration_seconds, 120);
        assert!(config.require_reason);
        assert_eq!(
            config.blocked_actions,
            vec![
                BlockedAction::DeleteAccount,
                BlockedAction::Custom("approve_payroll".into())
            ]
        );

        unsafe {
            std::env::remove_var("STAFFGATE_IMPERSONATION_MAX_DURATION_SECONDS");
            std::env::remove_var("STAFFGATE_IMPERSONATION_REQUIRE_REASON");
            std::env::remove_var("STAFFGATE_IMPERSONATION_BLOCKED_ACTIONS");
        }
    }
}
