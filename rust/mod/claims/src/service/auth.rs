use argon2::Argon2;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use tracing::{debug, info};

use factorclaim_core::ServiceError;
use factorclaim_sql::Value;

use crate::model::{CreateUser, LoginResponse, Token, TokenClaims, User, UserType};
use crate::service::{FactorService, Filter};

/// Passwords are cut to this many bytes before hashing or verifying, so
/// accounts created with bcrypt-era clients keep working.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Password given to accounts created by the development login.
const SIMPLE_LOGIN_PASSWORD: &str = "pass123";

fn password_bytes(password: &str) -> &[u8] {
    let bytes = password.as_bytes();
    &bytes[..bytes.len().min(MAX_PASSWORD_BYTES)]
}

/// Hash a password with argon2id into a PHC string.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password_bytes(password), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ServiceError::Internal(format!("failed to hash password: {}", e)))
}

/// Verify a password against a stored PHC hash. A malformed hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password_bytes(password), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Email used for accounts created by the development login:
/// lowercased name without spaces, at most 20 characters.
fn simple_login_email(name: &str) -> String {
    let local: String = name
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(20)
        .collect();
    format!("{}@fc.com", local)
}

impl FactorService {
    /// Issue a signed access token for a user.
    pub fn issue_token(&self, user: &User) -> Result<Token, ServiceError> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::minutes(self.config.token_expire_minutes);

        let claims = TokenClaims {
            sub: user.id.clone(),
            username: user.name.clone(),
            user_type: user.user_type.as_str().to_string(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Internal(format!("JWT encode failed: {}", e)))?;

        Ok(Token {
            access_token,
            token_type: "bearer".to_string(),
            expires_at: exp.to_rfc3339(),
        })
    }

    /// Verify and decode an access token.
    pub fn verify_token(&self, token: &str) -> Result<TokenClaims, ServiceError> {
        let data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            debug!("rejected token: {}", e);
            ServiceError::Unauthorized("Invalid authentication credentials".into())
        })?;
        Ok(data.claims)
    }

    /// Resolve a bearer token to an active user.
    pub fn current_user(&self, token: &str) -> Result<User, ServiceError> {
        let claims = self.verify_token(token)?;
        let user: User = self
            .get_record("users", &claims.sub)?
            .ok_or_else(|| ServiceError::Unauthorized("User not found".into()))?;
        if !user.is_active {
            return Err(ServiceError::Validation("Inactive user".into()));
        }
        Ok(user)
    }

    /// Check an email/password pair. Returns the user only when the
    /// password matches and the account is active.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, ServiceError> {
        let Some((user, hash)) = self.find_credentials(email)? else {
            return Ok(None);
        };
        if !verify_password(password, &hash) || !user.is_active {
            return Ok(None);
        }
        Ok(Some(user))
    }

    /// Email/password login.
    pub fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ServiceError> {
        let user = self
            .authenticate(email, password)?
            .ok_or_else(|| ServiceError::Unauthorized("Incorrect email or password".into()))?;
        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, "user logged in");
        Ok(LoginResponse {
            user,
            token,
            message: "Login successful".to_string(),
        })
    }

    /// Development login by name and role. Finds the user with this name and
    /// type, or creates one, then issues a token.
    pub fn simple_login(&self, name: &str, user_type: &str) -> Result<(User, Token), ServiceError> {
        if !self.config.simple_login {
            return Err(ServiceError::NotFound("Not Found".into()));
        }
        let user_type = UserType::from_str(user_type).ok_or_else(|| {
            ServiceError::Validation(
                "Invalid user type. Must be one of: Admin, Rep, Factory, Warehouse Manager".into(),
            )
        })?;
        let name = name.trim();

        let existing: Option<User> = self.find_first(
            "users",
            &[
                Filter::Eq("name", Value::from(name)),
                Filter::Eq("user_type", Value::from(user_type.as_str())),
            ],
        )?;

        let user = match existing {
            Some(user) if !user.is_active => {
                return Err(ServiceError::Validation("Inactive user".into()));
            }
            Some(user) => user,
            None => {
                let mut email = simple_login_email(name);
                if self.find_credentials(&email)?.is_some() {
                    // Same name under another role.
                    let slug = user_type.as_str().to_lowercase().replace(' ', "");
                    email = email.replacen('@', &format!("+{}@", slug), 1);
                }
                let user = self.create_user(CreateUser {
                    name: name.to_string(),
                    user_type,
                    contact_no: "0000000000".to_string(),
                    email: Some(email),
                    password: SIMPLE_LOGIN_PASSWORD.to_string(),
                })?;
                info!(user_id = %user.id, user_type = %user_type, "created user via simple login");
                user
            }
        };

        let token = self.issue_token(&user)?;
        Ok((user, token))
    }
}
