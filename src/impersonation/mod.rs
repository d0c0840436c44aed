//! Operator impersonation.
//!
//! Lets staff holding `impersonate_accounts` (or the super-admin role)
//! temporarily act as another account for support and testing, with a full
//! audit trail.
//!
//! # Features
//!
//! - Per-session state: one operator impersonating never affects another
//! - Time-limited: impersonation past `max_duration` ends the session
//! - Token rotation when impersonation stops
//! - Configurable restrictions (block destructive actions)
//!
//! # Example
//!
//! ```rust,ignore
//! use staffgate::impersonation::{ImpersonationController, StartImpersonation};
//!
//! let (token, _) = controller.open_session(&"1".into()).await?;
//!
//! controller
//!     .start_impersonation(&token, StartImpersonation::new("42").with_reason("Ticket #881"))
//!     .await?;
//! assert_eq!(controller.effective_account(&token).await?.id.as_str(), "42");
//!
//! // Stopping hands back a new token; the old one is dead.
//! let (token, _) = controller.stop_impersonation(&token).await?;
//! ```

mod config;
mod controller;
mod view;

pub use config::{BlockedAction, ImpersonationConfig};
pub use controller::{ImpersonationController, StartImpersonation};
pub use view::{IdentityView, ResolvedSession};
