//! IGSR API entry point

use anyhow::{Context, Result};
use igsr_api::GatewayServer;
use igsr_config::SettingsLoader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = SettingsLoader::new()
        .load_gateway()
        .context("invalid IGSR API settings")?;
    tracing::info!(
        engine = %config.backend.base_url,
        origins = ?config.cors_allow_origins,
        "settings loaded"
    );

    GatewayServer::new(config)
        .context("failed to assemble IGSR API")?
        .run()
        .await
        .context("IGSR API server failed")?;

    Ok(())
}
