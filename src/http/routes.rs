use super::IdentityContext;
use axum::Router;

/// Trait for composable route modules
///
/// Implement this trait to create modular, reusable route groups.
/// Each module registers its own routes and is composed into the main router.
///
/// # Example
///
/// ```ignore
/// struct AdminModule;
///
/// impl RouteModule for AdminModule {
///     fn routes(&self) -> Router<IdentityContext> {
///         Router::new().route("/audit", get(list_audit))
///     }
///
///     fn prefix(&self) -> Option<&str> {
///         Some("/admin")
///     }
/// }
/// ```
pub trait RouteModule {
    /// Returns a router with all routes for this module
    ///
    /// The router should NOT have state applied; state is applied once when
    /// the modules are merged. Handlers use `State<IdentityContext>`.
    fn routes(&self) -> Router<IdentityContext>
    where
        Self: Sized;

    /// Optional: specify a path prefix for all routes in this module
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// Registers this module's routes into the router
    fn register(self, router: Router<IdentityContext>) -> Router<IdentityContext>
    where
        Self: Sized,
    {
        let routes = self.routes();

        if let Some(prefix) = self.prefix() {
            router.nest(prefix, routes)
        } else {
            router.merge(routes)
        }
    }
}
