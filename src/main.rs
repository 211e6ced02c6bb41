//! ircbridge - IRC bridge for B3 game server administration
//!
//! A bot that joins an IRC channel, relays live chat and admin events
//! from a game server console, and lets channel operators run admin
//! commands against it.

mod bot;
mod bridge;
mod commands;
mod common;
mod config;
mod game;
mod irc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tracing::{debug, error, info, warn};

use bot::Session;
use bridge::ChannelBundle;
use config::{env::get_config_path, load_and_validate};
use game::MemoryConsole;

/// Game the in-memory console reports itself as.
const GAME_NAME: &str = "iourt42";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("{} v{} starting...", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Server: {}:{}", config.irc.address, config.irc.port);
    info!("  Nickname: {}", config.irc.nickname);
    info!("  Channel: {}", config.irc.channel);
    info!("  Game server: {}", config.join_address());

    let channels = ChannelBundle::new();
    let console = Arc::new(MemoryConsole::new(GAME_NAME).with_events(channels.console.event_tx));
    let shutdown_tx = channels.control.shutdown_tx;

    let mut session = Session::new(Arc::new(config), console, channels.session);
    let mut session_task = tokio::spawn(async move {
        if let Err(e) = session.run().await {
            error!("IRC session ended with error: {:#}", e);
        }
    });

    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - leaving IRC...");
            true
        }
        _ = &mut session_task => false,
    };

    if shutdown {
        if let Err(e) = shutdown_tx.send(true) {
            debug!("Shutdown channel closed (session already exited): {}", e);
        }
        match tokio::time::timeout(Duration::from_secs(5), session_task).await {
            Ok(Ok(())) => info!("IRC session closed gracefully"),
            Ok(Err(e)) => warn!("IRC session task panicked: {}", e),
            Err(_) => warn!("IRC session shutdown timed out"),
        }
    }

    info!("Exiting...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
