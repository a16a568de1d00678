//! Route registration: module routes plus system endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;

/// Build the complete application router.
///
/// Module routers already carry their own prefix and auth layer, so they are
/// merged rather than nested.
pub fn build_app(app: AppConfig, module_routes: Vec<Router>) -> Router {
    let system_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(Arc::new(app));

    let mut router = system_routes;
    for routes in module_routes {
        router = router.merge(routes);
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router.layer(cors).layer(TraceLayer::new_for_http())
}

async fn root(State(app): State<Arc<AppConfig>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "message": format!("Welcome to {}", app.name),
        "version": app.version,
    }))
}

async fn health(State(app): State<Arc<AppConfig>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": app.name,
    }))
}
