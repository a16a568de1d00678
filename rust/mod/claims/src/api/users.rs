use axum::extract::State;
use axum::routing::{get, put};
use axum::{Extension, Json, Router};
use serde_json::{json, Value};

use factorclaim_core::{ListParams, ServiceError};

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::{auth, require_admin, AppState, CurrentUser};
use crate::model::{CreateUser, UpdateUser, User, UserFilter};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/", get(list_users).post(create_user))
        .route("/users/me", get(auth::me))
        .route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/users/{id}/activate", put(activate_user))
        .route("/users/{id}/deactivate", put(deactivate_user))
}

async fn list_users(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiQuery(page): ApiQuery<ListParams>,
    ApiQuery(filter): ApiQuery<UserFilter>,
) -> Result<Json<Vec<User>>, ServiceError> {
    require_admin(&me)?;
    Ok(Json(svc.list_users(&filter, &page)?.items))
}

async fn create_user(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiJson(input): ApiJson<CreateUser>,
) -> Result<Json<User>, ServiceError> {
    require_admin(&me)?;
    Ok(Json(svc.create_user(input)?))
}

async fn get_user(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<User>, ServiceError> {
    require_admin(&me)?;
    Ok(Json(svc.get_user(&id)?))
}

async fn update_user(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
    ApiJson(patch): ApiJson<UpdateUser>,
) -> Result<Json<User>, ServiceError> {
    require_admin(&me)?;
    Ok(Json(svc.update_user(&id, patch)?))
}

async fn delete_user(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Value>, ServiceError> {
    require_admin(&me)?;
    svc.delete_user(&id)?;
    Ok(Json(json!({"message": "User deleted successfully"})))
}

async fn activate_user(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<User>, ServiceError> {
    require_admin(&me)?;
    Ok(Json(svc.set_user_active(&id, true)?))
}

async fn deactivate_user(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<User>, ServiceError> {
    require_admin(&me)?;
    Ok(Json(svc.set_user_active(&id, false)?))
}
