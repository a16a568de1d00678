use serde::{Deserialize, Serialize};

/// A production batch of a fixture model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub model_name: String,
    pub item_type: String,

    /// Batch code, printed on the item as a barcode.
    pub batch: String,

    /// RFC 3339 production timestamp.
    pub production_date: String,

    pub wattage: f64,
    pub supplier: String,

    #[serde(default)]
    pub contractor: Option<String>,

    #[serde(default)]
    pub notes: String,

    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating an item. `production_date` accepts RFC 3339, a naive
/// date-time or a bare `YYYY-MM-DD` date.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateItem {
    pub model_name: String,
    pub item_type: String,
    pub batch: String,
    pub production_date: String,
    pub wattage: f64,
    pub supplier: String,
    #[serde(default)]
    pub contractor: Option<String>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateItem {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default)]
    pub production_date: Option<String>,
    #[serde(default)]
    pub wattage: Option<f64>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub contractor: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Query filters for listing items.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemFilter {
    /// Case-insensitive substring.
    #[serde(default)]
    pub model_name: Option<String>,
    /// Case-insensitive substring.
    #[serde(default)]
    pub item_type: Option<String>,
    /// Exact batch code.
    #[serde(default)]
    pub batch: Option<String>,
}

/// Result of an item age check, shown before an item is added to a claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemAge {
    pub item_id: String,
    pub model_name: String,
    pub batch: String,
    pub production_date: String,
    pub age_months: i64,
    pub is_old: bool,
    pub requires_confirmation: bool,
    pub message: String,
}
