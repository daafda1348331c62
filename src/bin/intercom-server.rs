//! Intercom Server Application
//!
//! Accepts audio lanes and the control connection over WebSocket and serves
//! every lane its own mix-minus.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lan_intercom_mixer::{
    config::AppConfig,
    constants::*,
    mixer::{self, AudioMixer},
    server::WebServer,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting LAN Intercom Server");

    // Config path from args, or the platform config dir
    let config_path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => AppConfig::default_path()?,
    };
    let config = AppConfig::load_or_default(&config_path)
        .with_context(|| format!("Invalid config at {}", config_path.display()))?;

    tracing::info!(
        "Frames: {} samples @ {} Hz ({} ms), up to {} lanes",
        FRAME_SAMPLES,
        SAMPLE_RATE,
        FRAME_DURATION_MS,
        MAX_LANES
    );
    tracing::info!(
        "Mixer: stale after {} ms, silence gate {} dBFS, silent packets at {} dBFS",
        config.mixer.stale_after_ms,
        config.mixer.silence_threshold_dbfs,
        config.mixer.silent_packet_threshold_dbfs
    );

    let mixer = AudioMixer::new(config.mixer.settings()).context("Failed to create mixer")?;
    let web_server = WebServer::new(config, mixer::shared(mixer));

    let server_handle = web_server.start_background();

    tokio::select! {
        result = server_handle => {
            result.context("Server task panicked")??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}
