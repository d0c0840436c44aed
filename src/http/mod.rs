//! HTTP surface: axum routes, state and extractors.
//!
//! Provides the `RouteModule` trait for organizing routes, the identity
//! endpoints, and the session token extractor.

mod context;
mod identity;
pub mod routes;
mod token;

pub use context::IdentityContext;
pub use identity::{IdentityRoutes, LoginRequest, SessionResponse, router};
pub use routes::RouteModule;
pub use token::{ClientToken, TokenExtractor};
