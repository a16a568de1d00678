use tracing::info;

use factorclaim_core::{new_id, now_rfc3339, ListParams, ListResult, ServiceError};
use factorclaim_sql::Value;

use crate::model::{CreateUser, UpdateUser, User, UserFilter, UserType};
use crate::service::auth::hash_password;
use crate::service::{FactorService, Filter};
use crate::validate::Validator;

const EMAIL_TAKEN: &str = "Email already registered";

/// Emails are matched case-insensitively; store them trimmed and lowercased.
fn normalize_email(email: Option<String>) -> Option<String> {
    email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
}

fn not_found() -> ServiceError {
    ServiceError::NotFound("User not found".into())
}

/// A unique-constraint failure on `users` can only be the email.
fn email_conflict(e: ServiceError) -> ServiceError {
    match e {
        ServiceError::Conflict(_) => ServiceError::Conflict(EMAIL_TAKEN.into()),
        other => other,
    }
}

fn user_indexes(user: &User) -> Vec<(&'static str, Value)> {
    vec![
        ("name", Value::from(user.name.as_str())),
        ("user_type", Value::from(user.user_type.as_str())),
        ("email", Value::from(user.email.clone())),
        ("is_active", Value::from(user.is_active)),
        ("updated_at", Value::from(user.updated_at.as_str())),
    ]
}

impl FactorService {
    /// Create a user with a plaintext password.
    pub fn create_user(&self, input: CreateUser) -> Result<User, ServiceError> {
        let email = normalize_email(input.email);
        Validator::new()
            .len("name", input.name.trim(), 1, 100)
            .len("contact_no", input.contact_no.trim(), 10, 15)
            .email("email", email.as_deref())
            .len("password", &input.password, 6, 100)
            .finish()?;

        let hash = hash_password(&input.password)?;
        self.insert_user(
            input.name.trim(),
            input.user_type,
            input.contact_no.trim(),
            email,
            &hash,
        )
    }

    fn insert_user(
        &self,
        name: &str,
        user_type: UserType,
        contact_no: &str,
        email: Option<String>,
        password_hash: &str,
    ) -> Result<User, ServiceError> {
        if let Some(ref e) = email {
            if self.find_credentials(e)?.is_some() {
                return Err(ServiceError::Conflict(EMAIL_TAKEN.into()));
            }
        }

        let now = now_rfc3339();
        let user = User {
            id: new_id(),
            name: name.to_string(),
            user_type,
            contact_no: contact_no.to_string(),
            email,
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        };

        let mut indexes = user_indexes(&user);
        indexes.push(("password_hash", Value::from(password_hash)));
        indexes.push(("created_at", Value::from(user.created_at.as_str())));
        self.insert_record("users", &user.id, &user, &indexes)
            .map_err(email_conflict)?;

        Ok(user)
    }

    pub fn get_user(&self, id: &str) -> Result<User, ServiceError> {
        self.get_record("users", id)?.ok_or_else(not_found)
    }

    pub fn list_users(
        &self,
        filter: &UserFilter,
        page: &ListParams,
    ) -> Result<ListResult<User>, ServiceError> {
        let mut filters = Vec::new();
        if let Some(t) = filter.user_type {
            filters.push(Filter::Eq("user_type", Value::from(t.as_str())));
        }
        if let Some(active) = filter.is_active {
            filters.push(Filter::Eq("is_active", Value::from(active)));
        }
        self.list_records("users", &filters, page)
    }

    /// Apply a partial update. A blank password leaves the current one.
    pub fn update_user(&self, id: &str, patch: UpdateUser) -> Result<User, ServiceError> {
        let mut user = self.get_user(id)?;

        let email = normalize_email(patch.email);
        let password = patch.password.filter(|p| !p.trim().is_empty());
        Validator::new()
            .opt_len("name", patch.name.as_deref().map(str::trim), 1, 100)
            .opt_len("contact_no", patch.contact_no.as_deref().map(str::trim), 10, 15)
            .email("email", email.as_deref())
            .opt_len("password", password.as_deref(), 6, 100)
            .finish()?;

        if let Some(ref e) = email {
            if let Some((other, _)) = self.find_credentials(e)? {
                if other.id != user.id {
                    return Err(ServiceError::Conflict(EMAIL_TAKEN.into()));
                }
            }
        }

        if let Some(name) = patch.name {
            user.name = name.trim().to_string();
        }
        if let Some(t) = patch.user_type {
            user.user_type = t;
        }
        if let Some(contact) = patch.contact_no {
            user.contact_no = contact.trim().to_string();
        }
        if email.is_some() {
            user.email = email;
        }
        if let Some(active) = patch.is_active {
            user.is_active = active;
        }
        user.updated_at = now_rfc3339();

        let mut indexes = user_indexes(&user);
        if let Some(p) = password {
            indexes.push(("password_hash", Value::from(hash_password(&p)?)));
        }

        if !self
            .update_record("users", &user.id, &user, &indexes)
            .map_err(email_conflict)?
        {
            return Err(not_found());
        }
        Ok(user)
    }

    pub fn delete_user(&self, id: &str) -> Result<(), ServiceError> {
        if !self.delete_record("users", id)? {
            return Err(not_found());
        }
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    /// Activate or deactivate an account.
    pub fn set_user_active(&self, id: &str, active: bool) -> Result<User, ServiceError> {
        self.update_user(
            id,
            UpdateUser {
                is_active: Some(active),
                ..Default::default()
            },
        )
    }

    /// Look up a user and their password hash by email.
    pub(crate) fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, ServiceError> {
        let email = email.trim().to_lowercase();
        let rows = self
            .sql
            .query(
                "SELECT data, password_hash FROM users WHERE email = ?1",
                &[Value::from(email)],
            )
            .map_err(ServiceError::storage)?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let data = row
            .get_str("data")
            .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
        let user: User = serde_json::from_str(data).map_err(ServiceError::internal)?;
        let hash = row.get_str("password_hash").unwrap_or_default().to_string();
        Ok(Some((user, hash)))
    }

    /// Make sure an account with `email` exists, creating an Admin with the
    /// given argon2 hash if not. Returns true when an account was created.
    pub fn ensure_admin(&self, email: &str, password_hash: &str) -> Result<bool, ServiceError> {
        if self.find_credentials(email)?.is_some() {
            return Ok(false);
        }
        let user = self.insert_user(
            "Admin",
            UserType::Admin,
            "0000000000",
            normalize_email(Some(email.to_string())),
            password_hash,
        )?;
        info!(user_id = %user.id, email = %email, "created default admin");
        Ok(true)
    }
}
