use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::Response;

use factorclaim_core::ServiceError;

use crate::api::AppState;
use crate::model::{User, UserType};

/// Endpoints reachable without a token.
const PUBLIC_ROUTES: &[(&str, &str)] = &[
    ("POST", "/api/auth/login"),
    ("POST", "/api/auth/token"),
    ("POST", "/api/auth/simple-login"),
];

/// The authenticated caller, stored as a request extension.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Bearer-token middleware.
///
/// Resolves the token to an active user and stores it as [`CurrentUser`]
/// for handlers to extract via `Extension<CurrentUser>`.
pub async fn auth_middleware(
    State(svc): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    if is_public(req.method(), req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let token = extract_bearer(req.headers())
        .ok_or_else(|| ServiceError::Unauthorized("Not authenticated".into()))?;
    let user = svc.current_user(token)?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn is_public(method: &Method, path: &str) -> bool {
    let path = path.strip_suffix('/').unwrap_or(path);
    PUBLIC_ROUTES
        .iter()
        .any(|(m, p)| *m == method.as_str() && *p == path)
}

// ── Role guards ──

fn require_role(user: &User, roles: &[UserType]) -> Result<(), ServiceError> {
    if roles.contains(&user.user_type) {
        Ok(())
    } else {
        Err(ServiceError::PermissionDenied("Operation not permitted".into()))
    }
}

pub fn require_admin(user: &User) -> Result<(), ServiceError> {
    require_role(user, &[UserType::Admin])
}

pub fn require_admin_or_rep(user: &User) -> Result<(), ServiceError> {
    require_role(user, &[UserType::Admin, UserType::Rep])
}

pub fn require_admin_or_factory(user: &User) -> Result<(), ServiceError> {
    require_role(user, &[UserType::Admin, UserType::Factory])
}
