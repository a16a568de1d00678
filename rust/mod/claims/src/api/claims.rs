use axum::extract::State;
use axum::routing::{get, put};
use axum::{Extension, Json, Router};
use serde_json::{json, Value};

use factorclaim_core::{ListParams, ServiceError};

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::{require_admin_or_factory, require_admin_or_rep, AppState, CurrentUser};
use crate::model::{
    ApproveClaim, BiltyUpdate, Claim, ClaimFilter, CreateClaim, RejectClaim, UpdateClaim,
    VerifyClaim,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/claims", get(list_claims).post(create_claim))
        .route("/claims/", get(list_claims).post(create_claim))
        .route("/claims/unverified", get(list_unverified))
        .route("/claims/rep/{rep_id}", get(list_rep_claims))
        .route("/claims/claim-id/{claim_id}", get(get_claim_by_number))
        .route("/claims/{id}", get(get_claim).put(update_claim).delete(delete_claim))
        .route("/claims/{id}/bilty", put(update_bilty))
        .route("/claims/{id}/approve", put(approve_claim))
        .route("/claims/{id}/reject", put(reject_claim))
        .route("/claims/{id}/verify", put(verify_claim))
}

async fn list_claims(
    State(svc): State<AppState>,
    ApiQuery(page): ApiQuery<ListParams>,
    ApiQuery(filter): ApiQuery<ClaimFilter>,
) -> Result<Json<Vec<Claim>>, ServiceError> {
    Ok(Json(svc.list_claims(&filter, &page)?.items))
}

async fn create_claim(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiJson(input): ApiJson<CreateClaim>,
) -> Result<Json<Claim>, ServiceError> {
    require_admin_or_rep(&me)?;
    Ok(Json(svc.create_claim(input, &me)?))
}

async fn list_unverified(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiQuery(page): ApiQuery<ListParams>,
) -> Result<Json<Vec<Claim>>, ServiceError> {
    require_admin_or_factory(&me)?;
    Ok(Json(svc.list_unverified_claims(&page)?.items))
}

async fn list_rep_claims(
    State(svc): State<AppState>,
    ApiPath(rep_id): ApiPath<String>,
    ApiQuery(page): ApiQuery<ListParams>,
) -> Result<Json<Vec<Claim>>, ServiceError> {
    Ok(Json(svc.list_rep_claims(&rep_id, &page)?.items))
}

async fn get_claim_by_number(
    State(svc): State<AppState>,
    ApiPath(claim_id): ApiPath<String>,
) -> Result<Json<Claim>, ServiceError> {
    Ok(Json(svc.get_claim_by_number(&claim_id)?))
}

async fn get_claim(
    State(svc): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Claim>, ServiceError> {
    Ok(Json(svc.get_claim(&id)?))
}

async fn update_claim(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
    ApiJson(patch): ApiJson<UpdateClaim>,
) -> Result<Json<Claim>, ServiceError> {
    require_admin_or_rep(&me)?;
    Ok(Json(svc.update_claim(&id, patch)?))
}

async fn delete_claim(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Value>, ServiceError> {
    require_admin_or_rep(&me)?;
    svc.delete_claim(&id)?;
    Ok(Json(json!({"message": "Claim deleted successfully"})))
}

async fn update_bilty(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<BiltyUpdate>,
) -> Result<Json<Claim>, ServiceError> {
    require_admin_or_rep(&me)?;
    Ok(Json(svc.update_bilty(&id, &body.bilty_number)?))
}

async fn approve_claim(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
    body: Option<ApiJson<ApproveClaim>>,
) -> Result<Json<Claim>, ServiceError> {
    require_admin_or_factory(&me)?;
    let input = body.map(|ApiJson(b)| b).unwrap_or_default();
    Ok(Json(svc.approve_claim(&id, input, &me)?))
}

async fn reject_claim(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<RejectClaim>,
) -> Result<Json<Claim>, ServiceError> {
    require_admin_or_factory(&me)?;
    Ok(Json(svc.reject_claim(&id, &body.reason, &me)?))
}

async fn verify_claim(
    State(svc): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<String>,
    body: Option<ApiJson<VerifyClaim>>,
) -> Result<Json<Claim>, ServiceError> {
    require_admin_or_factory(&me)?;
    let input = body.map(|ApiJson(b)| b).unwrap_or_default();
    Ok(Json(svc.verify_claim(&id, input, &me)?))
}
