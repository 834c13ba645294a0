//! # coronetd
//!
//! The Coronet daemon: reads configuration from the environment, starts the
//! supervisor, and runs until interrupted.

use anyhow::Result;
use coronet_runtime::{RuntimeConfig, Supervisor};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  Coronet v{}", env!("CARGO_PKG_VERSION"));
    info!("  Block-paced inscription competitions");
    info!("===========================================");

    let config = RuntimeConfig::from_env();
    let supervisor = Supervisor::start(config).await?;

    info!("Coronet is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    supervisor.shutdown().await;
    Ok(())
}
