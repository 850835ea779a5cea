//! flockbot - a FlockDraw whiteboard bot
//!
//! Joins one whiteboard, tracks its peers, and keeps canvas bitmaps
//! flowing between them without holding any canvas state itself.

mod bot;
mod config;

use anyhow::Result;
use tracing::info;

use config::BotConfig;
use flockbot_client::{Session, SessionOptions, TcpTransport};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with INFO level by default (can be overridden via RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting flockbot v{}", env!("CARGO_PKG_VERSION"));

    let mut config = BotConfig::load();
    config.apply_args()?;

    let transport = TcpTransport::connect(&config.server, config.port).await?;
    let session = Session::new(
        transport,
        SessionOptions {
            server: config.server.clone(),
            whiteboard: config.whiteboard.clone(),
            username: config.username.clone(),
            dump_dir: config.dump_dir.clone(),
        },
    )?;

    bot::run(session, &config).await
}
