use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use factorclaim_core::ServiceError;

use crate::api::extract::{ApiForm, ApiJson, ApiQuery};
use crate::api::{AppState, CurrentUser};
use crate::model::{LoginRequest, LoginResponse, Token, TokenForm, User};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/token", post(token))
        .route("/auth/simple-login", post(simple_login))
        .route("/auth/me", get(me))
}

async fn login(
    State(svc): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ServiceError> {
    Ok(Json(svc.login(&body.email, &body.password)?))
}

/// OAuth2 password grant, for clients that speak the form flow.
async fn token(
    State(svc): State<AppState>,
    ApiForm(form): ApiForm<TokenForm>,
) -> Result<Json<Token>, ServiceError> {
    let resp = svc.login(&form.username, &form.password)?;
    Ok(Json(resp.token))
}

#[derive(Debug, Deserialize)]
struct SimpleLoginQuery {
    name: String,
    #[serde(rename = "type")]
    user_type: String,
}

async fn simple_login(
    State(svc): State<AppState>,
    ApiQuery(q): ApiQuery<SimpleLoginQuery>,
) -> Result<Json<Value>, ServiceError> {
    let (user, token) = svc.simple_login(&q.name, &q.user_type)?;
    Ok(Json(json!({
        "user": user,
        "access_token": token.access_token,
        "token_type": token.token_type,
    })))
}

pub(crate) async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}
