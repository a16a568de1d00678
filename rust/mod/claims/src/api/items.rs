use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::{json, Value};

use factorclaim_core::{ListParams, ServiceError};

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::{require_admin, AppState, CurrentUser};
use crate::model::{CreateItem, Item, ItemAge, ItemFilter, UpdateItem};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/", get(list_items).post(create_item))
        // Batch codes may contain '/'.
        .route("/items/batch/{*code}", get(get_item_by_batch))
        .route("/items/search/{term}", get(search_items))
        .route("/items/{id}", get(get_item).put(update_item).delete(delete_item))
        .route("/items/{id}/check-age", get(check_item_age))
}

async fn list_items(
    State(svc): State<AppState>,
    ApiQuery(page): ApiQuery<ListParams>,
    ApiQuery(filter): ApiQuery<ItemFilter>,
) -> Result<Json<Vec<Item>>, ServiceError> {
    Ok(Json(svc.list_items(&filter, &page)?.items))
}

async fn create_item(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiJson(input): ApiJson<CreateItem>,
) -> Result<Json<Item>, ServiceError> {
    require_admin(&me)?;
    Ok(Json(svc.create_item(input)?))
}

async fn get_item_by_batch(
    State(svc): State<AppState>,
    ApiPath(code): ApiPath<String>,
) -> Result<Json<Item>, ServiceError> {
    Ok(Json(svc.find_item_by_batch(&code)?))
}

async fn search_items(
    State(svc): State<AppState>,
    ApiPath(term): ApiPath<String>,
    ApiQuery(page): ApiQuery<ListParams>,
) -> Result<Json<Vec<Item>>, ServiceError> {
    Ok(Json(svc.search_items(&term, &page)?.items))
}

async fn get_item(
    State(svc): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Item>, ServiceError> {
    Ok(Json(svc.get_item(&id)?))
}

async fn update_item(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
    ApiJson(patch): ApiJson<UpdateItem>,
) -> Result<Json<Item>, ServiceError> {
    require_admin(&me)?;
    Ok(Json(svc.update_item(&id, patch)?))
}

async fn delete_item(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Value>, ServiceError> {
    require_admin(&me)?;
    svc.delete_item(&id)?;
    Ok(Json(json!({"message": "Item deleted successfully"})))
}

async fn check_item_age(
    State(svc): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ItemAge>, ServiceError> {
    Ok(Json(svc.check_item_age(&id)?))
}
