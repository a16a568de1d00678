use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::{json, Value};

use factorclaim_core::{ListParams, ServiceError};

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::{require_admin_or_rep, AppState, CurrentUser};
use crate::model::{CreateMerchant, Merchant, MerchantFilter, UpdateMerchant};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/merchants", get(list_merchants).post(create_merchant))
        .route("/merchants/", get(list_merchants).post(create_merchant))
        .route("/merchants/search/{term}", get(search_merchants))
        .route(
            "/merchants/{id}",
            get(get_merchant).put(update_merchant).delete(delete_merchant),
        )
}

async fn list_merchants(
    State(svc): State<AppState>,
    ApiQuery(page): ApiQuery<ListParams>,
    ApiQuery(filter): ApiQuery<MerchantFilter>,
) -> Result<Json<Vec<Merchant>>, ServiceError> {
    Ok(Json(svc.list_merchants(&filter, &page)?.items))
}

async fn create_merchant(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiJson(input): ApiJson<CreateMerchant>,
) -> Result<Json<Merchant>, ServiceError> {
    require_admin_or_rep(&me)?;
    Ok(Json(svc.create_merchant(input)?))
}

async fn search_merchants(
    State(svc): State<AppState>,
    ApiPath(term): ApiPath<String>,
    ApiQuery(page): ApiQuery<ListParams>,
) -> Result<Json<Vec<Merchant>>, ServiceError> {
    Ok(Json(svc.search_merchants(&term, &page)?.items))
}

async fn get_merchant(
    State(svc): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Merchant>, ServiceError> {
    Ok(Json(svc.get_merchant(&id)?))
}

async fn update_merchant(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
    ApiJson(patch): ApiJson<UpdateMerchant>,
) -> Result<Json<Merchant>, ServiceError> {
    require_admin_or_rep(&me)?;
    Ok(Json(svc.update_merchant(&id, patch)?))
}

async fn delete_merchant(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Value>, ServiceError> {
    require_admin_or_rep(&me)?;
    svc.delete_merchant(&id)?;
    Ok(Json(json!({"message": "Merchant deleted successfully"})))
}
