//! `factorclaimd`: the FactorClaim API server binary.
//!
//! Usage:
//!   factorclaimd init -o <path> --data-dir <dir> --admin-password <pw>
//!   factorclaimd serve -c <name-or-path> [--listen <addr>]
//!
//! A config name resolves to `/etc/factorclaim/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod init;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use factorclaim_core::Module;
use tracing::info;

use config::ServerConfig;

/// FactorClaim API server.
#[derive(Parser, Debug)]
#[command(name = "factorclaimd", about = "FactorClaim API server", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Config name or path to config file.
        #[arg(short = 'c', long = "config", required = true)]
        config: String,

        /// Listen address (overrides server.listen in the config).
        #[arg(long = "listen")]
        listen: Option<String>,
    },
    /// Write a new config with a generated JWT secret and admin hash.
    Init {
        /// Where to write the config file.
        #[arg(short = 'o', long = "output", required = true)]
        output: PathBuf,

        /// Directory for the SQLite and redb files.
        #[arg(long = "data-dir", required = true)]
        data_dir: String,

        #[arg(long = "listen", default_value = "0.0.0.0:8000")]
        listen: String,

        #[arg(long = "admin-email", default_value = "admin@factorclaim.com")]
        admin_email: String,

        #[arg(long = "admin-password", required = true)]
        admin_password: String,

        /// Enable the development-only simple-login endpoint.
        #[arg(long = "simple-login")]
        simple_login: bool,

        /// Overwrite an existing file.
        #[arg(long = "force")]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { config, listen } => serve(&config, listen).await,
        Command::Init {
            output,
            data_dir,
            listen,
            admin_email,
            admin_password,
            simple_login,
            force,
        } => {
            init::run(&init::InitOptions {
                output: &output,
                data_dir: &data_dir,
                listen: &listen,
                admin_email: &admin_email,
                admin_password: &admin_password,
                simple_login,
                force,
            })?;
            println!("Wrote {}", output.display());
            println!("Start the server with: factorclaimd serve -c {}", output.display());
            Ok(())
        }
    }
}

async fn serve(config_name: &str, listen: Option<String>) -> anyhow::Result<()> {
    // Load server configuration.
    let config_path = ServerConfig::resolve_path(config_name);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    // Verify configuration is valid.
    bootstrap::verify_config(&server_config)?;

    // Initialize storage.
    let data_dir = PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = factorclaim_core::ServiceConfig::new(
        &data_dir,
        listen.unwrap_or_else(|| server_config.server.listen.clone()),
    );

    let kv: Arc<dyn factorclaim_kv::KVStore> = Arc::new(
        factorclaim_kv::RedbStore::open(&core_config.resolve_db_path())
            .map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );
    let sql: Arc<dyn factorclaim_sql::SQLStore> = Arc::new(
        factorclaim_sql::SqliteStore::open(&core_config.resolve_sqlite_path())
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );

    let module = factorclaim::FactorClaimModule::new(
        Arc::clone(&sql),
        Arc::clone(&kv),
        server_config.to_factor_config(),
    )
    .map_err(|e| anyhow::anyhow!("failed to initialize claims module: {}", e))?;
    info!("FactorClaim module initialized, mounted at /{}", module.name());
    if server_config.dev.simple_login {
        tracing::warn!("simple-login is enabled; do not run this config in production");
    }

    // Bootstrap: ensure the admin account exists.
    bootstrap::ensure_admin(module.service(), &server_config)?;

    let app = routes::build_app(server_config.app.clone(), vec![module.routes()]);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!(
        "{} v{} listening on {}",
        server_config.app.name, server_config.app.version, core_config.listen
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
