use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ServiceError;

/// Largest page a list endpoint will return.
pub const MAX_LIMIT: usize = 1000;

/// Pagination parameters for list operations (`?skip=0&limit=100`).
#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    /// Number of records to skip.
    #[serde(default)]
    pub skip: usize,

    /// Maximum number of results to return, `1..=1000`.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}

impl ListParams {
    /// Reject a limit outside `1..=1000`.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(ServiceError::Validation(format!(
                "limit: must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(())
    }
}

/// Result wrapper for list operations.
#[derive(Debug, Clone, Serialize)]
pub struct ListResult<T: Serialize> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Generate a new random ID (UUIDv4, no dashes).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Get the current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Parse a client-supplied timestamp.
///
/// Accepts RFC 3339 (`2024-01-15T00:00:00Z`), a naive date-time taken as UTC
/// (`2024-01-15T00:00:00`), or a bare date taken as UTC midnight (`2024-01-15`).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
