//! Bootstrap: first-start checks and the default admin account.
//!
//! When factorclaimd starts:
//! 1. Verify the config has a JWT secret and a data directory, else refuse to start.
//! 2. Ensure the configured admin account exists.

use factorclaim::service::auth::verify_password;
use factorclaim::service::FactorService;
use tracing::{info, warn};

use crate::config::ServerConfig;

/// Password shipped in older sample configs. Warned about, never rejected.
const WEAK_ADMIN_PASSWORD: &str = "admin123";

/// Verify server configuration is ready for use.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.jwt.secret.is_empty() {
        anyhow::bail!(
            "JWT secret is empty in configuration.\n\
             Run `factorclaimd init` to generate a config first."
        );
    }
    if config.jwt.expire_minutes <= 0 {
        anyhow::bail!("jwt.expire_minutes must be positive.");
    }
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    Ok(())
}

/// Ensure the configured admin exists. Creates it if missing.
/// Returns true when the account was created on this start.
pub fn ensure_admin(svc: &FactorService, config: &ServerConfig) -> anyhow::Result<bool> {
    let admin = &config.admin;
    if admin.password_hash.is_empty() {
        info!("no admin password hash configured, skipping admin bootstrap");
        return Ok(false);
    }
    if verify_password(WEAK_ADMIN_PASSWORD, &admin.password_hash) {
        warn!(email = %admin.email, "admin password is the well-known default; change it");
    }

    let created = svc
        .ensure_admin(&admin.email, &admin.password_hash)
        .map_err(|e| anyhow::anyhow!("failed to create admin {}: {}", admin.email, e))?;
    if created {
        info!(email = %admin.email, "Created admin account");
    } else {
        info!(email = %admin.email, "admin account already exists");
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use factorclaim::service::auth::hash_password;
    use factorclaim::service::FactorConfig;
    use factorclaim_kv::{KVStore, RedbStore};
    use factorclaim_sql::{SQLStore, SqliteStore};

    use super::*;

    fn config(secret: &str, data_dir: &str) -> ServerConfig {
        toml::from_str(&format!(
            "[storage]\ndata_dir = \"{data_dir}\"\n[jwt]\nsecret = \"{secret}\"\n"
        ))
        .unwrap()
    }

    fn service() -> (tempfile::TempDir, Arc<FactorService>) {
        let dir = tempfile::tempdir().unwrap();
        let kv: Arc<dyn KVStore> = Arc::new(RedbStore::open(&dir.path().join("kv.redb")).unwrap());
        let sql: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let svc = FactorService::new(sql, kv, FactorConfig::default()).unwrap();
        (dir, svc)
    }

    #[test]
    fn verify_config_rejects_missing_fields() {
        assert!(verify_config(&config("secret", "/data")).is_ok());
        assert!(verify_config(&config("", "/data")).is_err());
        assert!(verify_config(&config("secret", "")).is_err());

        let mut bad = config("secret", "/data");
        bad.jwt.expire_minutes = 0;
        assert!(verify_config(&bad).is_err());
    }

    #[test]
    fn ensure_admin_is_idempotent() {
        let (_dir, svc) = service();
        let mut cfg = config("secret", "/data");
        assert!(!ensure_admin(&svc, &cfg).unwrap());

        cfg.admin.password_hash = hash_password("s3cret-pass").unwrap();
        assert!(ensure_admin(&svc, &cfg).unwrap());
        assert!(!ensure_admin(&svc, &cfg).unwrap());

        let resp = svc
            .login("Admin@FactorClaim.com", "s3cret-pass")
            .unwrap();
        assert_eq!(resp.user.name, "Admin");
    }
}
