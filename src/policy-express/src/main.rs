//! Policy Express — Thompson-sampling arm selection service for
//! per-(project, period) content experiments.
//!
//! Main entry point that wires the catalog, snapshot store, and bandit
//! engine behind the REST server.

use clap::Parser;
use policy_api::rest::AppState;
use policy_api::ApiServer;
use policy_bandit::PolicyEngine;
use policy_core::config::AppConfig;
use policy_store::{CatalogStore, SnapshotStore};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "policy-express")]
#[command(about = "Thompson-sampling arm selection policy service")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "POLICY_EXPRESS__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "POLICY_EXPRESS__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics port (overrides config)
    #[arg(long, env = "POLICY_EXPRESS__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// JSON file seeding the arm catalog (overrides config)
    #[arg(long, env = "POLICY_EXPRESS__CATALOG__SEED_FILE")]
    catalog_file: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "policy_express=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Policy Express starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }
    if let Some(file) = cli.catalog_file {
        config.catalog.seed_file = Some(file);
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        "Configuration loaded"
    );

    // Initialize the arm catalog
    let catalog = match &config.catalog.seed_file {
        Some(path) => Arc::new(CatalogStore::load_from_file(path)?),
        None => {
            info!("No catalog seed file configured, seeding demo arms");
            Arc::new(CatalogStore::with_demo_arms())
        }
    };

    // Initialize the snapshot store and bandit engine
    let snapshots = Arc::new(SnapshotStore::new(config.policy.max_history));
    let engine = Arc::new(PolicyEngine::new(config.policy.default_promo_ratio));

    let state = AppState {
        engine,
        catalog,
        snapshots,
        node_id: config.node_id.clone(),
        start_time: Instant::now(),
    };

    let api_server = ApiServer::new(config.clone(), state);

    // Start metrics exporter
    if config.metrics.enabled {
        if let Err(e) = api_server.start_metrics().await {
            error!(error = %e, "Failed to start metrics exporter");
        }
    }

    info!("Policy Express is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
