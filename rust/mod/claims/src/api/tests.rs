//! End-to-end router tests: real SQLite (in memory) and redb (temp dir)
//! behind the full `/api` router, driven with `oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::model::{CreateUser, User, UserType};
use crate::service::{testutil, FactorConfig, FactorService};

struct TestApp {
    _dir: tempfile::TempDir,
    svc: Arc<FactorService>,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        Self::with_config(FactorConfig {
            jwt_secret: "test-secret".into(),
            ..Default::default()
        })
    }

    fn with_config(config: FactorConfig) -> Self {
        let (dir, svc) = testutil::service_with(config);
        let router = super::build_router(svc.clone());
        Self {
            _dir: dir,
            svc,
            router,
        }
    }

    /// Create a user directly and return it with a bearer token.
    fn login_as(&self, name: &str, t: UserType) -> (User, String) {
        let user = self
            .svc
            .create_user(CreateUser {
                name: name.into(),
                user_type: t,
                contact_no: "03001234567".into(),
                email: None,
                password: "secret1".into(),
            })
            .unwrap();
        let token = self.svc.issue_token(&user).unwrap().access_token;
        (user, token)
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_string(&v).unwrap())
            }
            None => Body::empty(),
        };
        let resp = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            json!(null)
        } else {
            serde_json::from_slice(&bytes).unwrap_or(json!(null))
        };
        (status, json)
    }
}

fn item_body(batch: &str, production_date: &str) -> Value {
    json!({
        "model_name": "LED Tube 20W",
        "item_type": "Tube",
        "batch": batch,
        "production_date": production_date,
        "wattage": 20,
        "supplier": "Lumina",
    })
}

fn merchant_body() -> Value {
    json!({
        "name": "Noor Electric",
        "address": "12 Mall Road, Lahore",
        "contact": "04231234567",
    })
}

fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

// ── Authentication ──

#[tokio::test]
async fn missing_or_bad_token_is_401() {
    let app = TestApp::new();

    let req = Request::builder().uri("/api/items/").body(Body::empty()).unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers()[header::WWW_AUTHENTICATE], "Bearer");

    let (s, body) = app.call("GET", "/api/items/", None, Some("junk")).await;
    assert_eq!(s, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid authentication credentials");
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn login_and_me() {
    let app = TestApp::new();
    app.svc
        .create_user(CreateUser {
            name: "Sara".into(),
            user_type: UserType::Factory,
            contact_no: "03001234567".into(),
            email: Some("sara@fc.com".into()),
            password: "secret1".into(),
        })
        .unwrap();

    let (s, body) = app
        .call(
            "POST",
            "/api/auth/login",
            Some(json!({"email": "sara@fc.com", "password": "secret1"})),
            None,
        )
        .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["token"]["token_type"], "bearer");
    assert_eq!(body["user"]["type"], "Factory");
    assert!(body["user"].get("password_hash").is_none());

    let token = body["token"]["access_token"].as_str().unwrap().to_string();
    for uri in ["/api/auth/me", "/api/users/me"] {
        let (s, me) = app.call("GET", uri, None, Some(&token)).await;
        assert_eq!(s, StatusCode::OK, "{uri}");
        assert_eq!(me["email"], "sara@fc.com");
    }

    let (s, body) = app
        .call(
            "POST",
            "/api/auth/login",
            Some(json!({"email": "sara@fc.com", "password": "nope"})),
            None,
        )
        .await;
    assert_eq!(s, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Incorrect email or password");
}

#[tokio::test]
async fn token_form_login() {
    let app = TestApp::new();
    app.svc
        .create_user(CreateUser {
            name: "Sara".into(),
            user_type: UserType::Rep,
            contact_no: "03001234567".into(),
            email: Some("sara@fc.com".into()),
            password: "secret1".into(),
        })
        .unwrap();

    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=sara%40fc.com&password=secret1"))
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let token: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(token["token_type"], "bearer");
    assert!(token["access_token"].as_str().unwrap().len() > 20);
}

#[tokio::test]
async fn inactive_user_is_400() {
    let app = TestApp::new();
    let (user, token) = app.login_as("Rep", UserType::Rep);
    app.svc.set_user_active(&user.id, false).unwrap();

    let (s, body) = app.call("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Inactive user");
}

#[tokio::test]
async fn simple_login_toggle() {
    let app = TestApp::new();
    let (s, _) = app
        .call("POST", "/api/auth/simple-login?name=Ali&type=Rep", None, None)
        .await;
    assert_eq!(s, StatusCode::NOT_FOUND);

    let app = TestApp::with_config(FactorConfig {
        jwt_secret: "s".into(),
        simple_login: true,
        ..Default::default()
    });
    let (s, body) = app
        .call(
            "POST",
            "/api/auth/simple-login?name=Ali%20Khan&type=Warehouse%20Manager",
            None,
            None,
        )
        .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body["user"]["type"], "Warehouse Manager");
    assert_eq!(body["token_type"], "bearer");

    let token = body["access_token"].as_str().unwrap().to_string();
    let (s, _) = app.call("GET", "/api/claims/", None, Some(&token)).await;
    assert_eq!(s, StatusCode::OK);

    let (s, _) = app
        .call("POST", "/api/auth/simple-login?name=Ali&type=Boss", None, None)
        .await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
}

// ── Role guards ──

#[tokio::test]
async fn users_are_admin_only() {
    let app = TestApp::new();
    let (_, admin) = app.login_as("Admin", UserType::Admin);
    let (_, rep) = app.login_as("Rep", UserType::Rep);

    let (s, body) = app.call("GET", "/api/users/", None, Some(&rep)).await;
    assert_eq!(s, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Operation not permitted");

    let new_user = json!({
        "name": "Wm",
        "type": "Warehouse Manager",
        "contact_no": "03001234567",
        "email": "wm@fc.com",
        "password": "secret1",
    });
    let (s, created) = app
        .call("POST", "/api/users/", Some(new_user.clone()), Some(&admin))
        .await;
    assert_eq!(s, StatusCode::OK);
    let id = created["id"].as_str().unwrap().to_string();

    let (s, body) = app.call("POST", "/api/users/", Some(new_user), Some(&admin)).await;
    assert_eq!(s, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Email already registered");

    let (s, list) = app
        .call("GET", "/api/users/?user_type=Rep", None, Some(&admin))
        .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (s, user) = app
        .call("PUT", &format!("/api/users/{id}/deactivate"), None, Some(&admin))
        .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(user["is_active"], false);

    let (s, body) = app
        .call("DELETE", &format!("/api/users/{id}"), None, Some(&admin))
        .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");

    let (s, body) = app.call("GET", &format!("/api/users/{id}"), None, Some(&admin)).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "User not found");
}

#[tokio::test]
async fn list_limit_is_bounded() {
    let app = TestApp::new();
    let (_, admin) = app.login_as("Admin", UserType::Admin);
    let (s, _) = app.call("GET", "/api/items/?limit=0", None, Some(&admin)).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    let (s, _) = app.call("GET", "/api/items/?limit=1001", None, Some(&admin)).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    let (s, _) = app.call("GET", "/api/items/?skip=5&limit=1000", None, Some(&admin)).await;
    assert_eq!(s, StatusCode::OK);
}

// ── Items ──

#[tokio::test]
async fn item_barcode_and_age() {
    let app = TestApp::new();
    let (_, admin) = app.login_as("Admin", UserType::Admin);
    let (_, wm) = app.login_as("Wm", UserType::WarehouseManager);

    let (s, _) = app
        .call("POST", "/api/items/", Some(item_body("X-1", &today())), Some(&wm))
        .await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    let (s, item) = app
        .call(
            "POST",
            "/api/items/",
            Some(item_body("LT/20W/2024", &today())),
            Some(&admin),
        )
        .await;
    assert_eq!(s, StatusCode::OK);
    let id = item["id"].as_str().unwrap().to_string();

    let (s, found) = app
        .call("GET", "/api/items/batch/lt/20w/2024", None, Some(&wm))
        .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(found["id"], id.as_str());

    let (s, body) = app.call("GET", "/api/items/batch/NOPE", None, Some(&wm)).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
    assert_eq!(
        body["detail"],
        "Item with barcode 'NOPE' not found. Please verify the item exists in inventory."
    );

    let (s, age) = app
        .call("GET", &format!("/api/items/{id}/check-age"), None, Some(&wm))
        .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(age["is_old"], false);
    assert_eq!(age["age_months"], 0);

    let (s, hits) = app.call("GET", "/api/items/search/lumi", None, Some(&wm)).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(hits.as_array().unwrap().len(), 1);
}

// ── Claims ──

#[tokio::test]
async fn claim_lifecycle_over_http() {
    let app = TestApp::new();
    let (_, admin) = app.login_as("Admin", UserType::Admin);
    let (rep_user, rep) = app.login_as("Rep", UserType::Rep);
    let (factory_user, factory) = app.login_as("Factory", UserType::Factory);

    let (_, item) = app
        .call("POST", "/api/items/", Some(item_body("B-1", &today())), Some(&admin))
        .await;
    let (s, merchant) = app
        .call("POST", "/api/merchants/", Some(merchant_body()), Some(&rep))
        .await;
    assert_eq!(s, StatusCode::OK);

    let claim_body = json!({
        "rep_id": rep_user.id,
        "merchant_id": merchant["id"],
        "items": [{"item_id": item["id"], "quantity": 4}],
        "notes": "first claim",
    });

    // Factory cannot file claims.
    let (s, _) = app
        .call("POST", "/api/claims/", Some(claim_body.clone()), Some(&factory))
        .await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    let (s, claim) = app
        .call("POST", "/api/claims/", Some(claim_body), Some(&rep))
        .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(claim["status"], "Bilty Pending");
    assert_eq!(claim["verified"], false);
    let id = claim["id"].as_str().unwrap().to_string();
    let number = claim["claim_id"].as_str().unwrap().to_string();
    assert!(number.starts_with("CLM-") && number.ends_with("-0001"));

    let (s, unverified) = app
        .call("GET", "/api/claims/unverified", None, Some(&factory))
        .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(unverified.as_array().unwrap().len(), 1);
    let (s, _) = app.call("GET", "/api/claims/unverified", None, Some(&rep)).await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    // Approving before the bilty is entered is refused.
    let (s, body) = app
        .call("PUT", &format!("/api/claims/{id}/approve"), None, Some(&factory))
        .await;
    assert_eq!(s, StatusCode::CONFLICT);
    assert_eq!(
        body["detail"],
        format!("claim {number} cannot approve (status: Bilty Pending)")
    );

    let (s, claim) = app
        .call(
            "PUT",
            &format!("/api/claims/{id}/bilty"),
            Some(json!({"bilty_number": "BLT-42"})),
            Some(&rep),
        )
        .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(claim["status"], "Approval Pending");

    // Reps cannot approve.
    let (s, _) = app
        .call("PUT", &format!("/api/claims/{id}/approve"), None, Some(&rep))
        .await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    let (s, claim) = app
        .call(
            "PUT",
            &format!("/api/claims/{id}/approve"),
            Some(json!({"notes": "stock received"})),
            Some(&factory),
        )
        .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(claim["status"], "Approved");
    assert_eq!(claim["verified"], true);
    assert_eq!(claim["approved_by"], factory_user.id.as_str());

    // Closed to edits.
    let (s, _) = app
        .call(
            "PUT",
            &format!("/api/claims/{id}"),
            Some(json!({"notes": "late edit"})),
            Some(&rep),
        )
        .await;
    assert_eq!(s, StatusCode::CONFLICT);

    let (s, by_number) = app
        .call("GET", &format!("/api/claims/claim-id/{number}"), None, Some(&rep))
        .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(by_number["id"], id.as_str());

    let (s, filtered) = app
        .call("GET", "/api/claims/?status=Approved&verified=true", None, Some(&rep))
        .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(filtered.as_array().unwrap().len(), 1);

    let (s, mine) = app
        .call("GET", &format!("/api/claims/rep/{}", rep_user.id), None, Some(&rep))
        .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (s, body) = app
        .call("DELETE", &format!("/api/claims/{id}"), None, Some(&admin))
        .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body["message"], "Claim deleted successfully");

    let (s, body) = app
        .call("GET", &format!("/api/claims/claim-id/{number}"), None, Some(&rep))
        .await;
    assert_eq!(s, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], format!("Claim with claim_id '{number}' not found"));
}

#[tokio::test]
async fn claim_reject_and_verify() {
    let app = TestApp::new();
    let (_, admin) = app.login_as("Admin", UserType::Admin);
    let (rep_user, rep) = app.login_as("Rep", UserType::Rep);
    let (_, factory) = app.login_as("Factory", UserType::Factory);

    let (_, item) = app
        .call("POST", "/api/items/", Some(item_body("B-1", &today())), Some(&admin))
        .await;
    let (_, merchant) = app
        .call("POST", "/api/merchants/", Some(merchant_body()), Some(&admin))
        .await;
    let (_, claim) = app
        .call(
            "POST",
            "/api/claims/",
            Some(json!({
                "rep_id": rep_user.id,
                "merchant_id": merchant["id"],
                "items": [{"item_id": item["id"], "quantity": 1}],
            })),
            Some(&rep),
        )
        .await;
    let id = claim["id"].as_str().unwrap().to_string();

    let (s, verified) = app
        .call(
            "PUT",
            &format!("/api/claims/{id}/verify"),
            Some(json!({"notes": "counted"})),
            Some(&factory),
        )
        .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(verified["verified"], true);
    assert_eq!(verified["status"], "Bilty Pending");

    let (s, rejected) = app
        .call(
            "PUT",
            &format!("/api/claims/{id}/reject"),
            Some(json!({"reason": "not our product"})),
            Some(&factory),
        )
        .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(rejected["status"], "Rejected");
    assert_eq!(rejected["rejection_reason"], "not our product");

    let (s, _) = app
        .call(
            "PUT",
            &format!("/api/claims/{id}/bilty"),
            Some(json!({"bilty_number": "BLT-1"})),
            Some(&rep),
        )
        .await;
    assert_eq!(s, StatusCode::CONFLICT);
}

#[tokio::test]
async fn old_item_claim_requires_force_add() {
    let app = TestApp::new();
    let (_, admin) = app.login_as("Admin", UserType::Admin);
    let (rep_user, rep) = app.login_as("Rep", UserType::Rep);

    let (_, item) = app
        .call("POST", "/api/items/", Some(item_body("OLD-1", "2020-01-01")), Some(&admin))
        .await;
    let (_, merchant) = app
        .call("POST", "/api/merchants/", Some(merchant_body()), Some(&rep))
        .await;

    let mut body = json!({
        "rep_id": rep_user.id,
        "merchant_id": merchant["id"],
        "items": [{"item_id": item["id"], "quantity": 2}],
    });
    let (s, err) = app.call("POST", "/api/claims/", Some(body.clone()), Some(&rep)).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    assert!(err["detail"].as_str().unwrap().contains("months old"));

    body["items"][0]["force_add"] = json!(true);
    let (s, _) = app.call("POST", "/api/claims/", Some(body), Some(&rep)).await;
    assert_eq!(s, StatusCode::OK);
}

// ── Malformed input and routing ──

#[tokio::test]
async fn malformed_input_gets_json_detail() {
    let app = TestApp::new();
    let (rep, rep_token) = app.login_as("Rep One", UserType::Rep);

    let (s, body) = app
        .call("POST", "/api/claims/", Some(json!({"rep_id": rep.id})), Some(&rep_token))
        .await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert!(!body["detail"].as_str().unwrap_or_default().is_empty(), "{body}");

    for uri in ["/api/claims/?status=bogus", "/api/claims/?skip=-1"] {
        let (s, body) = app.call("GET", uri, None, Some(&rep_token)).await;
        assert_eq!(s, StatusCode::BAD_REQUEST, "{uri}");
        assert!(!body["detail"].as_str().unwrap_or_default().is_empty(), "{uri}: {body}");
    }

    // The token endpoint takes a form, not JSON.
    let (s, body) = app
        .call("POST", "/api/auth/token", Some(json!({"username": "x"})), None)
        .await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string(), "{body}");
}

#[tokio::test]
async fn unknown_path_is_404_with_or_without_token() {
    let app = TestApp::new();
    let (_, token) = app.login_as("Admin", UserType::Admin);

    let (s, _) = app.call("GET", "/api/nope", None, None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
    let (s, _) = app.call("GET", "/api/nope", None, Some(&token)).await;
    assert_eq!(s, StatusCode::NOT_FOUND);

    // Known routes still demand a token.
    let (s, _) = app.call("GET", "/api/claims/", None, None).await;
    assert_eq!(s, StatusCode::UNAUTHORIZED);
}
