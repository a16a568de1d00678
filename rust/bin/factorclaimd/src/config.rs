//! Server configuration, read from a TOML file.
//!
//! ```toml
//! [app]
//! name = "FactorClaim API"
//! version = "1.0.0"
//!
//! [server]
//! listen = "0.0.0.0:8000"
//!
//! [storage]
//! data_dir = "/var/lib/factorclaim"
//!
//! [jwt]
//! secret = "<64 hex chars>"
//! expire_minutes = 30
//!
//! [admin]
//! email = "admin@factorclaim.com"
//! password_hash = "$argon2id$..."
//!
//! [dev]
//! simple_login = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use factorclaim::service::FactorConfig;

/// Directory holding named configs (`-c prod` reads `/etc/factorclaim/prod.toml`).
const CONFIG_DIR: &str = "/etc/factorclaim";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub server: ServerSection,
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub dev: DevConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "FactorClaim API".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_expire_minutes")]
    pub expire_minutes: i64,
}

fn default_expire_minutes() -> i64 {
    30
}

/// The account ensured at startup. Empty `password_hash` skips it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub email: String,
    #[serde(default)]
    pub password_hash: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: "admin@factorclaim.com".to_string(),
            password_hash: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevConfig {
    #[serde(default)]
    pub simple_login: bool,
}

impl ServerConfig {
    /// Resolve a config name or path. Anything containing `/` or `.` is a
    /// path; a bare name maps to `/etc/factorclaim/<name>.toml`.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(CONFIG_DIR).join(format!("{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Settings handed to the claims service.
    pub fn to_factor_config(&self) -> FactorConfig {
        FactorConfig {
            jwt_secret: self.jwt.secret.clone(),
            token_expire_minutes: self.jwt.expire_minutes,
            simple_login: self.dev.simple_login,
        }
    }
}
