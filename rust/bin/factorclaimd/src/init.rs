//! `factorclaimd init`: write a fresh server config.
//!
//! Generates a random JWT secret and an argon2 hash of the admin password so
//! that plain-text credentials never land on disk.

use std::path::Path;

use rand::Rng;

use factorclaim::service::auth::hash_password;

use crate::config::{
    AdminConfig, AppConfig, DevConfig, JwtConfig, ServerConfig, ServerSection, StorageConfig,
};

pub struct InitOptions<'a> {
    pub output: &'a Path,
    pub data_dir: &'a str,
    pub listen: &'a str,
    pub admin_email: &'a str,
    pub admin_password: &'a str,
    pub simple_login: bool,
    pub force: bool,
}

/// 32 random bytes, hex encoded.
fn generate_secret() -> String {
    let mut rng = rand::thread_rng();
    (0..32).map(|_| format!("{:02x}", rng.gen::<u8>())).collect()
}

pub fn run(opts: &InitOptions<'_>) -> anyhow::Result<ServerConfig> {
    if opts.output.exists() && !opts.force {
        anyhow::bail!(
            "{} already exists. Pass --force to overwrite.",
            opts.output.display()
        );
    }
    if opts.admin_password.len() < 6 {
        anyhow::bail!("admin password must be at least 6 characters");
    }

    let password_hash =
        hash_password(opts.admin_password).map_err(|e| anyhow::anyhow!("{}", e))?;

    let config = ServerConfig {
        app: AppConfig::default(),
        server: ServerSection {
            listen: opts.listen.to_string(),
        },
        storage: StorageConfig {
            data_dir: opts.data_dir.to_string(),
        },
        jwt: JwtConfig {
            secret: generate_secret(),
            expire_minutes: 30,
        },
        admin: AdminConfig {
            email: opts.admin_email.trim().to_lowercase(),
            password_hash,
        },
        dev: DevConfig {
            simple_login: opts.simple_login,
        },
    };
    config.save(opts.output)?;
    Ok(config)
}
