pub mod auth;
pub mod claim;
pub mod item;
pub mod merchant;
pub mod schema;
pub mod sequence;
pub mod user;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use factorclaim_core::{ListParams, ListResult, ServiceError};
use factorclaim_kv::KVStore;
use factorclaim_sql::{SQLError, SQLStore, Value};

/// Configuration for the FactorClaim service.
#[derive(Debug, Clone)]
pub struct FactorConfig {
    /// JWT signing secret (HS256).
    pub jwt_secret: String,
    /// Access token lifetime in minutes (default: 30).
    pub token_expire_minutes: i64,
    /// Enables `POST /api/auth/simple-login` for development.
    pub simple_login: bool,
}

impl Default for FactorConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "factorclaim-dev-secret-change-me".to_string(),
            token_expire_minutes: 30,
            simple_login: false,
        }
    }
}

/// The FactorClaim service. Holds storage backends and configuration.
pub struct FactorService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) kv: Arc<dyn KVStore>,
    pub(crate) config: FactorConfig,
}

/// A WHERE-clause condition for [`FactorService::list_records`].
pub(crate) enum Filter<'a> {
    /// `col = value`
    Eq(&'a str, Value),
    /// `col = value`, ignoring ASCII case.
    EqNoCase(&'a str, String),
    /// Case-insensitive substring match on one column.
    Contains(&'a str, String),
    /// Case-insensitive substring match on any of several columns.
    AnyContains(&'a [&'a str], String),
}

/// Escape `%`, `_` and `\` so user input matches literally inside LIKE.
fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// Render filters as ` WHERE ...` with positional params starting at `?1`.
///
/// SQLite's LIKE is case-insensitive for ASCII, which covers batch codes and
/// model names.
fn build_where(filters: &[Filter<'_>]) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut params = Vec::new();

    for f in filters {
        match f {
            Filter::Eq(col, val) => {
                params.push(val.clone());
                clauses.push(format!("{} = ?{}", col, params.len()));
            }
            Filter::EqNoCase(col, val) => {
                params.push(Value::Text(val.clone()));
                clauses.push(format!("{} = ?{} COLLATE NOCASE", col, params.len()));
            }
            Filter::Contains(col, term) => {
                params.push(Value::Text(like_pattern(term)));
                clauses.push(format!("{} LIKE ?{} ESCAPE '\\'", col, params.len()));
            }
            Filter::AnyContains(cols, term) => {
                params.push(Value::Text(like_pattern(term)));
                let idx = params.len();
                let any: Vec<String> = cols
                    .iter()
                    .map(|c| format!("{} LIKE ?{} ESCAPE '\\'", c, idx))
                    .collect();
                clauses.push(format!("({})", any.join(" OR ")));
            }
        }
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (where_sql, params)
}

fn storage(e: SQLError) -> ServiceError {
    ServiceError::storage(e)
}

impl FactorService {
    /// Create a new FactorService, initializing the DB schema.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        kv: Arc<dyn KVStore>,
        config: FactorConfig,
    ) -> Result<Arc<Self>, ServiceError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self { sql, kv, config }))
    }

    pub fn config(&self) -> &FactorConfig {
        &self.config
    }

    // ── Generic record helpers ──
    //
    // Each table stores the full record as JSON in `data`, next to the
    // columns that are filtered or constrained on.

    /// Insert a record as JSON into a table with indexed columns.
    /// A constraint violation is reported as `Conflict`.
    pub(crate) fn insert_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), ServiceError> {
        let json = serde_json::to_string(record).map_err(ServiceError::internal)?;

        let mut cols = vec!["id", "data"];
        let mut placeholders = vec!["?1".to_string(), "?2".to_string()];
        let mut params = vec![Value::Text(id.to_string()), Value::Text(json)];

        for (col, val) in indexes {
            cols.push(col);
            params.push(val.clone());
            placeholders.push(format!("?{}", params.len()));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            cols.join(", "),
            placeholders.join(", "),
        );

        match self.sql.exec(&sql, &params) {
            Ok(_) => Ok(()),
            Err(SQLError::Constraint(msg)) => Err(ServiceError::Conflict(msg)),
            Err(e) => Err(storage(e)),
        }
    }

    /// Get a record by id, deserializing the JSON `data` column.
    pub(crate) fn get_record<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> Result<Option<T>, ServiceError> {
        self.find_first(table, &[Filter::Eq("id", Value::Text(id.to_string()))])
    }

    /// First record matching all filters, newest first.
    pub(crate) fn find_first<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[Filter<'_>],
    ) -> Result<Option<T>, ServiceError> {
        let (where_sql, params) = build_where(filters);
        let sql = format!(
            "SELECT data FROM {}{} ORDER BY created_at DESC LIMIT 1",
            table, where_sql
        );
        let rows = self.sql.query(&sql, &params).map_err(storage)?;
        rows.first().map(decode_row).transpose()
    }

    /// Update a record's JSON data and indexed columns.
    /// Returns false if no row has this id.
    pub(crate) fn update_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<bool, ServiceError> {
        self.update_record_if(table, id, record, indexes, None)
    }

    /// Like [`FactorService::update_record`], but only when `guard` column
    /// still holds the expected value. Returns false when nothing matched,
    /// which lets callers detect a concurrent change.
    pub(crate) fn update_record_if<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
        guard: Option<(&str, Value)>,
    ) -> Result<bool, ServiceError> {
        let json = serde_json::to_string(record).map_err(ServiceError::internal)?;

        let mut sets = vec!["data = ?1".to_string()];
        let mut params: Vec<Value> = vec![Value::Text(json)];

        for (col, val) in indexes {
            params.push(val.clone());
            sets.push(format!("{} = ?{}", col, params.len()));
        }

        params.push(Value::Text(id.to_string()));
        let mut where_sql = format!("id = ?{}", params.len());
        if let Some((col, val)) = guard {
            params.push(val);
            where_sql.push_str(&format!(" AND {} = ?{}", col, params.len()));
        }

        let sql = format!("UPDATE {} SET {} WHERE {}", table, sets.join(", "), where_sql);

        match self.sql.exec(&sql, &params) {
            Ok(affected) => Ok(affected > 0),
            Err(SQLError::Constraint(msg)) => Err(ServiceError::Conflict(msg)),
            Err(e) => Err(storage(e)),
        }
    }

    /// Delete a record by id. Returns false if no row has this id.
    pub(crate) fn delete_record(&self, table: &str, id: &str) -> Result<bool, ServiceError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table);
        let affected = self
            .sql
            .exec(&sql, &[Value::Text(id.to_string())])
            .map_err(storage)?;
        Ok(affected > 0)
    }

    /// List records with filters and pagination, newest first.
    pub(crate) fn list_records<T: DeserializeOwned + Serialize>(
        &self,
        table: &str,
        filters: &[Filter<'_>],
        page: &ListParams,
    ) -> Result<ListResult<T>, ServiceError> {
        page.validate()?;
        let (where_sql, mut params) = build_where(filters);

        let count_sql = format!("SELECT COUNT(*) AS cnt FROM {}{}", table, where_sql);
        let total = self
            .sql
            .query(&count_sql, &params)
            .map_err(storage)?
            .first()
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        params.push(Value::Integer(page.limit as i64));
        let limit_idx = params.len();
        params.push(Value::Integer(page.skip as i64));
        let offset_idx = params.len();

        let sql = format!(
            "SELECT data FROM {}{} ORDER BY created_at DESC LIMIT ?{} OFFSET ?{}",
            table, where_sql, limit_idx, offset_idx,
        );
        let rows = self.sql.query(&sql, &params).map_err(storage)?;
        let items = rows.iter().map(decode_row).collect::<Result<Vec<T>, _>>()?;

        Ok(ListResult { items, total })
    }
}

fn decode_row<T: DeserializeOwned>(row: &factorclaim_sql::Row) -> Result<T, ServiceError> {
    let data = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
    serde_json::from_str(data).map_err(ServiceError::internal)
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::Arc;

    use factorclaim_kv::RedbStore;
    use factorclaim_sql::SqliteStore;

    use super::{FactorConfig, FactorService};

    /// In-memory SQLite plus a temp-dir redb. Keep the TempDir alive.
    pub fn service_with(config: FactorConfig) -> (tempfile::TempDir, Arc<FactorService>) {
        let dir = tempfile::tempdir().unwrap();
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        let kv = Arc::new(RedbStore::open(&dir.path().join("data.redb")).unwrap());
        let svc = FactorService::new(sql, kv, config).unwrap();
        (dir, svc)
    }

    pub fn service() -> (tempfile::TempDir, Arc<FactorService>) {
        service_with(FactorConfig {
            jwt_secret: "test-secret".into(),
            ..Default::default()
        })
    }
}
