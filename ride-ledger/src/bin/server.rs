//! Ride ledger server binary

use ride_ledger::{Config, RideLedger};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting RideLedger Server");

    // Load configuration
    let config = Config::from_env()?;

    // Open ledger
    let ledger = RideLedger::open(config).await?;
    tracing::info!("Ledger opened successfully");

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down ride ledger server");
    ledger.shutdown().await?;
    Ok(())
}
