use serde::{Deserialize, Serialize};

use super::User;

/// JWT claims payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: user id.
    pub sub: String,

    /// User display name.
    pub username: String,

    /// Role name, e.g. "Rep".
    pub user_type: String,

    #[serde(default)]
    pub email: Option<String>,

    /// Issued at (unix timestamp).
    pub iat: i64,

    /// Expiration (unix timestamp).
    pub exp: i64,
}

/// A signed access token as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    /// Always "bearer".
    pub token_type: String,
    /// RFC 3339 expiry.
    pub expires_at: String,
}

/// Request body for `POST /api/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response body for `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: Token,
    pub message: String,
}

/// OAuth2 password-grant form for `POST /api/auth/token`. `username` carries
/// the email address.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}
