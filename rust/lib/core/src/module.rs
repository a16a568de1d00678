use axum::Router;

/// A service module that contributes HTTP routes.
///
/// The binary entry point collects modules and merges their routers.
pub trait Module: Send + Sync {
    /// Module name, used for logging. Also the path prefix its routes live under.
    fn name(&self) -> &str;

    /// Return the module's routes, already prefixed with `/{name}` and
    /// wrapped in whatever auth layer the module needs.
    fn routes(&self) -> Router;
}
