//! Listing Ads: campaign targeting and placement resolution service for the
//! local-business directory.
//!
//! Main entry point that loads configuration and starts the server.

use clap::Parser;
use listing_ads_api::ApiServer;
use listing_ads_core::config::AppConfig;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "listing-ads")]
#[command(about = "Ad campaign targeting and priority resolution service")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "LISTING_ADS__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "LISTING_ADS__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics port (overrides config)
    #[arg(long, env = "LISTING_ADS__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Seed demo campaigns into the in-memory store
    #[arg(long, default_value_t = false)]
    seed_demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "listing_ads=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Listing Ads starting up");

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
    if cli.seed_demo {
        config.targeting.seed_demo_data = true;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        simulation = config.targeting.simulation_enabled,
        "Configuration loaded"
    );

    let api_server = ApiServer::new(config);

    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("Listing Ads is ready to serve traffic");

    api_server.start_http().await?;

    Ok(())
}
