use serde::{Deserialize, Serialize};

/// The role a user account plays. Serialized with the display names the
/// desktop client matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserType {
    Admin,
    Rep,
    Factory,
    #[serde(rename = "Warehouse Manager")]
    WarehouseManager,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Rep => "Rep",
            Self::Factory => "Factory",
            Self::WarehouseManager => "Warehouse Manager",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Admin" => Some(Self::Admin),
            "Rep" => Some(Self::Rep),
            "Factory" => Some(Self::Factory),
            "Warehouse Manager" => Some(Self::WarehouseManager),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user account. The password hash lives in its own column and is never
/// part of this record, so it cannot leak through a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    pub name: String,

    #[serde(rename = "type")]
    pub user_type: UserType,

    pub contact_no: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// Input for creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub contact_no: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

/// Partial update for a user. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub user_type: Option<UserType>,
    #[serde(default)]
    pub contact_no: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// A blank password means "keep the current one".
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Query filters for listing users.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    #[serde(default)]
    pub user_type: Option<UserType>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}
