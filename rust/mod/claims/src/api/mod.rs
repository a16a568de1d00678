mod auth;
mod claims;
mod extract;
mod items;
mod merchants;
mod middleware;
mod users;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::Router;

use crate::service::FactorService;

pub use middleware::{require_admin, require_admin_or_factory, require_admin_or_rep, CurrentUser};

/// Shared application state.
pub type AppState = Arc<FactorService>;

/// Build the complete `/api` router.
///
/// Every route requires a bearer token except the login endpoints; the
/// middleware resolves it to a [`CurrentUser`] extension. It is a route
/// layer, so unknown paths answer 404 without a token.
pub fn build_router(svc: Arc<FactorService>) -> Router {
    let api = Router::new()
        .merge(auth::routes())
        .merge(users::routes())
        .merge(items::routes())
        .merge(merchants::routes())
        .merge(claims::routes());

    Router::new()
        .nest("/api", api)
        .route_layer(axum::middleware::from_fn_with_state(
            svc.clone(),
            middleware::auth_middleware,
        ))
        .with_state(svc)
}
