//! Sword Duel Relay Server
//!
//! Binary entry point: read config from the environment, install
//! tracing, and run the relay until the process is stopped.

use tracing::info;
use tracing_subscriber::EnvFilter;

use sword_duel::network::{RelayServer, ServerConfig};
use sword_duel::VERSION;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env();
    info!("Sword Duel Relay v{VERSION}");
    info!("Win threshold: {} hits", config.win_threshold);

    RelayServer::new(config).run().await?;
    Ok(())
}
