//! HTTP API handlers

use axum::{extract::State, http::StatusCode, Json};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::codec::audio::MAX_EXT_LEN;
use crate::error::PacketError;
use crate::protocol::{LaneId, LaneName};
use crate::server::server::AppState;

/// API response wrapper
#[derive(serde::Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// System status
#[derive(serde::Serialize)]
pub struct SystemStatus {
    pub lane_count: usize,
    pub control_connected: bool,
    pub uptime_seconds: u64,
    pub started_at: DateTime<Utc>,
}

/// One lane as shown by the API
#[derive(serde::Serialize)]
pub struct LaneStatus {
    pub lane_id: LaneId,
    pub name: LaneName,
    pub gain_db: f32,
    pub loudness_dbfs: f32,
}

/// Result of an ext broadcast
#[derive(serde::Serialize)]
pub struct ExtDelivery {
    pub bytes: usize,
    pub receivers: usize,
}

/// Get system status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<SystemStatus>> {
    let status = SystemStatus {
        lane_count: state.mixer.lock().lane_count(),
        control_connected: state.control_lock.is_held(),
        uptime_seconds: state.started.elapsed().as_secs(),
        started_at: state.started_at,
    };

    Json(ApiResponse::ok(status))
}

/// Get all lanes with their current loudness
pub async fn get_lanes(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<LaneStatus>>> {
    let (roster, loudness) = {
        let mixer = state.mixer.lock();
        (mixer.get_lane_roster(), mixer.get_lane_loudness())
    };

    // Both snapshots come from one lock, so they line up
    let lanes = roster
        .into_iter()
        .zip(loudness)
        .map(|(info, level)| LaneStatus {
            lane_id: info.lane_id,
            name: info.name,
            gain_db: info.gain_db,
            loudness_dbfs: level.loudness_dbfs,
        })
        .collect();

    Json(ApiResponse::ok(lanes))
}

/// Attach raw bytes to the next frame of every audio connection
pub async fn post_ext(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> (StatusCode, Json<ApiResponse<ExtDelivery>>) {
    if body.len() > MAX_EXT_LEN {
        let e = PacketError::ExtTooLong(body.len());
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(e.to_string())));
    }

    let bytes = body.len();
    // No audio connection is not an error
    let receivers = state.ext_tx.send(body).unwrap_or(0);
    tracing::debug!("Ext payload of {} bytes queued for {} connections", bytes, receivers);

    (StatusCode::OK, Json(ApiResponse::ok(ExtDelivery { bytes, receivers })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::mixer::{self, AudioMixer, MixerSettings};
    use crate::server::server::router;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let mixer = mixer::shared(AudioMixer::new(MixerSettings::default()).unwrap());
        Arc::new(AppState::new(AppConfig::default(), mixer))
    }

    async fn call(state: Arc<AppState>, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_status() {
        let state = test_state();
        state.mixer.lock().create_lane().unwrap();
        let _guard = state.control_lock.try_acquire().unwrap();

        let request = Request::get("/api/status").body(Body::empty()).unwrap();
        let (status, json) = call(state, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["lane_count"], 1);
        assert_eq!(json["data"]["control_connected"], true);
        assert!(json["data"]["started_at"].is_string());
    }

    #[tokio::test]
    async fn test_lanes() {
        let state = test_state();
        {
            let mut mixer = state.mixer.lock();
            mixer.create_lane().unwrap();
            let lane = mixer.create_lane().unwrap();
            mixer.set_lane_gain(lane, -6.0).unwrap();
        }

        let request = Request::get("/api/lanes").body(Body::empty()).unwrap();
        let (status, json) = call(state, request).await;

        assert_eq!(status, StatusCode::OK);
        let lanes = json["data"].as_array().unwrap();
        assert_eq!(lanes.len(), 2);
        assert_eq!(lanes[1]["lane_id"], 1);
        assert_eq!(lanes[1]["name"], "NEW");
        assert_eq!(lanes[1]["gain_db"], -6.0);
        assert_eq!(lanes[1]["loudness_dbfs"], -80.0);
    }

    #[tokio::test]
    async fn test_ext_broadcast() {
        let state = test_state();
        let mut rx = state.ext_tx.subscribe();

        let request = Request::post("/api/ext").body(Body::from(vec![1u8, 2, 3])).unwrap();
        let (status, json) = call(state.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["receivers"], 1);
        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(&[1, 2, 3]));

        let request = Request::post("/api/ext").body(Body::from(vec![0u8; 256])).unwrap();
        let (status, json) = call(state, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }
}
