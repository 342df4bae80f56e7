//! `clinicd`, the clinic server binary.
//!
//! Usage:
//!   clinicd -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/clinic/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod adapters;
mod auth_middleware;
mod bootstrap;
mod config;
mod login;
mod routes;

use std::sync::Arc;

use clap::Parser;
use clinic_sql::{SQLStore, SqliteStore};
use tracing::info;

use config::ServerConfig;

/// Clinic server.
#[derive(Parser, Debug)]
#[command(name = "clinicd", about = "Clinic CRM server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    bootstrap::verify_config(&server_config)?;

    std::fs::create_dir_all(&server_config.storage.data_dir)?;
    let db_path = server_config.database_path();
    let sql: Arc<dyn SQLStore> = Arc::new(
        SqliteStore::open(&db_path).map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );
    info!("Opened database {}", db_path.display());

    let app = routes::build_app(server_config, sql)?;

    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("Clinic server listening on {}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
