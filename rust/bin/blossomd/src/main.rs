//! `blossomd` — the Blossom policy server.
//!
//! Usage:
//!   blossomd --data-dir <dir> [--listen <addr>] [--admin <principal>]
//!
//! Every route except `/health` and `/version` expects the acting principal
//! in the `x-blossom-principal` header.

use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use tracing::info;

use blossom_core::{Module, ServiceConfig};
use ngac::NgacModule;

/// Blossom policy server.
#[derive(Parser, Debug)]
#[command(name = "blossomd", about = "Blossom NGAC policy server")]
struct Cli {
    /// Directory holding the policy database.
    #[arg(long = "data-dir", env = "BLOSSOM_DATA_DIR", default_value = "/var/lib/blossom")]
    data_dir: PathBuf,

    /// Database file (defaults to `<data-dir>/ngac.redb`).
    #[arg(long = "db", env = "BLOSSOM_DB")]
    db: Option<PathBuf>,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Principal allowed to initialize the shared partition.
    #[arg(long = "admin", env = "BLOSSOM_ADMIN", default_value = blossom_core::config::DEFAULT_ADMIN_PRINCIPAL)]
    admin: String,

    /// Partition holding the shared policy.
    #[arg(long = "shared-partition", default_value = blossom_core::config::DEFAULT_SHARED_PARTITION)]
    shared_partition: String,
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

    std::fs::create_dir_all(&cli.data_dir)?;
    let config = ServiceConfig {
        data_dir: Some(cli.data_dir.clone()),
        db_path: cli.db.clone(),
        listen: cli.listen.clone(),
        admin_principal: cli.admin.clone(),
        shared_partition: cli.shared_partition.clone(),
    };

    let db_path = config.resolve_db_path();
    let kv: Arc<dyn blossom_kv::KVStore> = Arc::new(
        blossom_kv::RedbStore::open(&db_path)
            .map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );
    info!("Policy store opened at {}", db_path.display());

    let ngac_module = NgacModule::new(Arc::clone(&kv), config.clone());
    info!(
        "NGAC module initialized (shared partition {:?}, admin {:?})",
        config.shared_partition, config.admin_principal
    );

    let system_routes = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));
    let app = system_routes.merge(ngac_module.routes());

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    info!("Blossom server listening on {}", config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
