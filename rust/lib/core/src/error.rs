use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Clients match on these,
// never on the human-readable message string.

/// Stable error code constants.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const INTERNAL: &str = "INTERNAL";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
}

// ── ServiceError ────────────────────────────────────────────────────

/// Unified service error type used by every handler.
///
/// Each variant maps to a stable error code (see [`error_code`]) and an
/// HTTP status code. The JSON body carries both, plus `detail`, which is
/// the field the desktop client reads its message from:
///
/// ```json
/// {"code": "NOT_FOUND", "message": "Claim not found", "detail": "Claim not found"}
/// ```
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Resource does not exist. HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate key, or a state transition that the current state forbids. HTTP 409.
    #[error("{0}")]
    Conflict(String),

    /// Input data is invalid. HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid authentication credentials. HTTP 401.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but the role is not allowed. HTTP 403.
    #[error("{0}")]
    PermissionDenied(String),

    /// Storage backend failure. HTTP 500.
    #[error("{0}")]
    Storage(String),

    /// Unexpected internal error. HTTP 500.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable code and HTTP status for each variant.
    fn parts(&self) -> (&'static str, StatusCode) {
        use self::error_code::*;
        match self {
            ServiceError::NotFound(_) => (NOT_FOUND, StatusCode::NOT_FOUND),
            ServiceError::Conflict(_) => (ALREADY_EXISTS, StatusCode::CONFLICT),
            ServiceError::Validation(_) => (VALIDATION_FAILED, StatusCode::BAD_REQUEST),
            ServiceError::Unauthorized(_) => (UNAUTHENTICATED, StatusCode::UNAUTHORIZED),
            ServiceError::PermissionDenied(_) => (PERMISSION_DENIED, StatusCode::FORBIDDEN),
            ServiceError::Storage(_) => (STORAGE_ERROR, StatusCode::INTERNAL_SERVER_ERROR),
            ServiceError::Internal(_) => (INTERNAL, StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        self.parts().0
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.parts().1
    }

    /// Wrap any displayable storage failure.
    pub fn storage(e: impl std::fmt::Display) -> Self {
        ServiceError::Storage(e.to_string())
    }

    /// Wrap any displayable unexpected failure.
    pub fn internal(e: impl std::fmt::Display) -> Self {
        ServiceError::Internal(e.to_string())
    }
}

// Extractor rejections (bad body, query or form) surface as validation
// errors so every failure carries the same JSON body.
macro_rules! rejection_into_validation {
    ($($rejection:ty),*) => {
        $(
            impl From<$rejection> for ServiceError {
                fn from(r: $rejection) -> Self {
                    ServiceError::Validation(r.body_text())
                }
            }
        )*
    };
}

rejection_into_validation!(JsonRejection, QueryRejection, FormRejection, PathRejection);

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "{}", message);
        }
        let body = serde_json::json!({
            "code": self.error_code(),
            "message": message,
            "detail": message,
        });
        let mut resp = (status, axum::Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            resp.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        resp
    }
}
