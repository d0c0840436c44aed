//! Staffgate - identity, permission resolution and impersonation for
//! staffing and scheduling platforms
//!
//! Staffgate decides which permissions an authenticated account holds, lets
//! platform staff operate as another account for support and testing, and
//! keeps every impersonation session isolated from every other session.
//!
//! # Features
//!
//! - **Access**: role defaults, explicit overrides, super-admin union, page policy
//! - **Sessions**: per-token identity records with optimistic versioning
//! - **Impersonation**: start/stop state machine, token rotation, time limits
//! - **Audit**: best-effort-but-logged impersonation trail
//! - **HTTP**: axum routes for login, `/auth/me` and impersonation
//! - **Testing**: Alba-style HTTP testing utilities and in-memory backends
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use staffgate::{ConfigBuilder, IdentityContext};
//!
//! #[tokio::main]
//! async fn main() -> staffgate::Result<()> {
//!     let config = ConfigBuilder::new().from_env().build()?;
//!     staffgate::init_tracing_with_config(&config);
//!
//!     let context = IdentityContext::from_config(&config, accounts, verifier)?;
//!     let app = staffgate::http::router(context);
//!
//!     let listener = tokio::net::TcpListener::bind(config.server.addr()?).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![allow(async_fn_in_trait)] // async_trait macro handles Send/Sync bounds properly

pub mod access;
pub mod accounts;
pub mod audit;
mod config;
mod error;
pub mod http;
pub mod impersonation;
pub mod session;
pub mod testing;
mod utils;

// Re-exports for public API
pub use access::{PageAccessPolicy, Permission, PermissionResolver, PermissionSet, Role, RoleDefaults};
pub use accounts::{Account, AccountDirectory, AccountId, CredentialVerifier};
pub use audit::{AuditAction, AuditEmitter, AuditRecord, AuditSink};
pub use config::{Config, ConfigBuilder, LoggingConfig, ServerConfig};
pub use error::{ErrorResponse, Result, StaffgateError};
pub use http::{IdentityContext, IdentityRoutes, RouteModule};
pub use impersonation::{
    BlockedAction, IdentityView, ImpersonationConfig, ImpersonationController, StartImpersonation,
};
pub use session::{SessionConfig, SessionIdentity, SessionIdentityStore, SessionToken};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, typically in main().
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "staffgate=debug")
/// - `STAFFGATE_LOG_JSON`: Set to "true" for JSON formatted logs
///
/// # Example
///
/// ```rust,no_run
/// #[tokio::main]
/// async fn main() {
///     staffgate::init_tracing();
///     // ... rest of your service
/// }
/// ```
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("STAFFGATE_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
