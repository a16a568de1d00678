use serde::{Deserialize, Serialize};

/// A merchant (shop) that sends items back through claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Merchant {
    pub id: String,
    pub name: String,
    pub address: String,
    pub contact: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMerchant {
    pub name: String,
    pub address: String,
    pub contact: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMerchant {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MerchantFilter {
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}
