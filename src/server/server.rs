//! HTTP / WebSocket server

use axum::{
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::mixer::SharedMixer;
use crate::server::guard::ControlLock;
use crate::server::{handlers, websocket};

/// Pending ext payloads kept per audio connection before lagging
const EXT_CHANNEL_CAPACITY: usize = 16;

/// Shared state passed to all request handlers
pub struct AppState {
    pub mixer: SharedMixer,
    pub config: AppConfig,
    /// Exclusive control connection
    pub control_lock: ControlLock,
    /// Ext bytes for the next outgoing frame of every audio connection
    pub ext_tx: broadcast::Sender<Bytes>,
    pub started_at: DateTime<Utc>,
    pub started: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, mixer: SharedMixer) -> Self {
        let (ext_tx, _) = broadcast::channel(EXT_CHANNEL_CAPACITY);
        Self {
            mixer,
            config,
            control_lock: ControlLock::new(),
            ext_tx,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }
}

/// Build the router with all endpoints
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/audio", get(websocket::audio_ws_handler))
        .route("/api/mixer", get(websocket::mixer_ws_handler))
        .route("/api/status", get(handlers::get_status))
        .route("/api/lanes", get(handlers::get_lanes))
        .route("/api/ext", post(handlers::post_ext))
        .layer(cors)
        .with_state(state)
}

/// Intercom server
pub struct WebServer {
    state: Arc<AppState>,
}

impl WebServer {
    pub fn new(config: AppConfig, mixer: SharedMixer) -> Self {
        Self {
            state: Arc::new(AppState::new(config, mixer)),
        }
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Bind and serve until the listener fails
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.server.socket_addr()?;
        let app = router(self.state);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Intercom server listening on http://{}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Server(e.to_string()))
    }

    /// Run on a background task
    pub fn start_background(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }
}
