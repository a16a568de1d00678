use factorclaim_core::ServiceError;
use factorclaim_sql::SQLStore;

/// Initialize the SQLite schema for all FactorClaim resources.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    let statements = [
        // Users: email is unique when present; the password hash stays out
        // of the JSON record.
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            user_type TEXT NOT NULL,
            email TEXT UNIQUE,
            is_active INTEGER NOT NULL DEFAULT 1,
            password_hash TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_users_type ON users(user_type)",
        "CREATE INDEX IF NOT EXISTS idx_users_name ON users(name)",

        // Items
        "CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            model_name TEXT NOT NULL,
            item_type TEXT NOT NULL,
            batch TEXT NOT NULL,
            supplier TEXT NOT NULL,
            contractor TEXT,
            production_date TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_items_batch ON items(batch)",
        "CREATE INDEX IF NOT EXISTS idx_items_model ON items(model_name)",

        // Merchants
        "CREATE TABLE IF NOT EXISTS merchants (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            address TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_merchants_name ON merchants(name)",

        // Claims
        "CREATE TABLE IF NOT EXISTS claims (
            id TEXT PRIMARY KEY,
            claim_id TEXT NOT NULL UNIQUE,
            rep_id TEXT NOT NULL,
            merchant_id TEXT NOT NULL,
            status TEXT NOT NULL,
            verified INTEGER NOT NULL DEFAULT 0,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_claims_rep ON claims(rep_id)",
        "CREATE INDEX IF NOT EXISTS idx_claims_merchant ON claims(merchant_id)",
        "CREATE INDEX IF NOT EXISTS idx_claims_status ON claims(status)",
        "CREATE INDEX IF NOT EXISTS idx_claims_verified ON claims(verified)",
    ];

    for stmt in &statements {
        sql.exec(stmt, &[]).map_err(ServiceError::storage)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use factorclaim_sql::SqliteStore;

    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        init_schema(&store).unwrap();
        init_schema(&store).unwrap();
        let rows = store
            .query(
                "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                &[],
            )
            .unwrap();
        let names: Vec<_> = rows.iter().filter_map(|r| r.get_str("name")).collect();
        assert_eq!(names, vec!["claims", "items", "merchants", "users"]);
    }
}
