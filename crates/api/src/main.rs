//! Property Price Prediction Service - Main Entry Point

use api::{init_logging, run_server, ServiceConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load()?;
    init_logging(&config.logging);

    info!("=== Rentverse Price Prediction API v{} ===", env!("CARGO_PKG_VERSION"));
    run_server(config).await
}
