//! Standalone relay server, configured from `ROOMCAST_*` environment
//! variables.

use roomcast::prelude::*;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roomcast=info,relay_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_addr = %config.bind_addr,
        ws_path = config.ws_path.as_deref().unwrap_or("*"),
        outbox_capacity = config.outbox_capacity,
        handshake_timeout = ?config.handshake_timeout,
        "Configuration loaded"
    );

    let server = RoomcastServerBuilder::with_config(config).build().await?;
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    info!("Relay server stopped");
    Ok(())
}
