//! WebSocket sessions
//!
//! | Path | Description |
//! |------|-------------|
//! | `/api/audio` | One lane per connection, audio packet in, mix-minus packet out |
//! | `/api/mixer` | Exclusive control connection: roster, notices, loudness, gain commands |

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::codec::{audio, gain, loudness, notice, roster, GainModify};
use crate::error::{PacketError, Result};
use crate::mixer::MixerEvent;
use crate::protocol::LaneId;
use crate::server::guard::{ControlGuard, LaneLease};
use crate::server::handlers::ApiResponse;
use crate::server::server::AppState;

/// Upgrade to an audio connection
pub async fn audio_ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_audio_socket(socket, state))
}

/// Upgrade to the control connection, 403 while another one is open
///
/// The lock is checked before the upgrade headers, so a busy mixer answers
/// 403 to any request.
pub async fn mixer_ws_handler(
    State(state): State<Arc<AppState>>,
    ws: Option<WebSocketUpgrade>,
) -> Response {
    let Some(guard) = state.control_lock.try_acquire() else {
        tracing::warn!("Rejecting control connection, one is already open");
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::<()>::error("Mixer client is in use")),
        )
            .into_response();
    };

    let Some(ws) = ws else {
        return (
            StatusCode::UPGRADE_REQUIRED,
            Json(ApiResponse::<()>::error("WebSocket upgrade expected")),
        )
            .into_response();
    };

    ws.on_upgrade(move |socket| handle_mixer_socket(socket, state, guard))
}

/// Run one lane: every inbound frame is answered with the mix of all others
async fn handle_audio_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let conn_id = Uuid::new_v4();

    let mut lease = match LaneLease::create(&state.mixer) {
        Ok(lease) => lease,
        Err(e) => {
            tracing::warn!("[{}] Rejecting audio connection: {}", conn_id, e);
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::AGAIN,
                    reason: e.to_string().into(),
                })))
                .await;
            return;
        }
    };
    tracing::info!("[{}] Audio connection opened as lane {}", conn_id, lease.lane_id());

    let mut ext_rx = state.ext_tx.subscribe();
    let mut pending_ext = Bytes::new();

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        tracing::debug!("[{}] Audio socket error: {}", conn_id, e);
                        break;
                    }
                    None => break,
                };

                match msg {
                    Message::Binary(data) => {
                        match mix_frame(&state, lease.lane_id(), &data, &pending_ext) {
                            Ok(reply) => {
                                pending_ext = Bytes::new();
                                if socket.send(Message::Binary(reply.to_vec())).await.is_err() {
                                    break; // Client disconnected
                                }
                            }
                            Err(e) => tracing::warn!("[{}] Dropping audio frame: {}", conn_id, e),
                        }
                    }
                    Message::Text(_) => {
                        tracing::warn!("[{}] Dropping audio frame: {}", conn_id, PacketError::UnexpectedMessage("text"));
                    }
                    Message::Close(_) => break,
                    _ => {} // Ping/pong
                }
            }
            ext = ext_rx.recv() => match ext {
                Ok(bytes) => pending_ext = bytes,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!("[{}] Skipped {} ext payloads", conn_id, n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    let lane_id = lease.lane_id();
    lease.release();
    tracing::info!("[{}] Audio connection for lane {} closed", conn_id, lane_id);
}

/// Decode one inbound frame, mix, and encode the reply
fn mix_frame(state: &AppState, lane_id: LaneId, raw: &[u8], ext: &[u8]) -> Result<Bytes> {
    let packet = audio::decode(raw)?;
    let mixed = state
        .mixer
        .lock()
        .lane_io(lane_id, &packet.pcm, &packet.name)?;

    let reply = audio::encode(
        &mixed,
        &packet.name,
        ext,
        state.config.mixer.silent_packet_threshold_dbfs,
    )?;
    Ok(reply)
}

/// Run the control connection until it closes
async fn handle_mixer_socket(socket: WebSocket, state: Arc<AppState>, _guard: ControlGuard) {
    let conn_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Bytes>();

    // Subscribe and take the roster under one lock so no event is lost
    let (subscription, initial_roster) = {
        let mut mixer = state.mixer.lock();
        let subscription = mixer.subscribe(Arc::new(move |event: &MixerEvent| {
            let _ = event_tx.send(notice::encode_event(event));
        }));
        (subscription, roster::encode(&mixer.get_lane_roster()))
    };
    tracing::info!("[{}] Control connection opened", conn_id);

    let mut ticker = tokio::time::interval(state.config.server.loudness_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    if sender.send(Message::Binary(initial_roster.to_vec())).await.is_ok() {
        loop {
            tokio::select! {
                Some(packet) = event_rx.recv() => {
                    if sender.send(Message::Binary(packet.to_vec())).await.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let report = loudness::encode(&state.mixer.lock().get_lane_loudness());
                    if sender.send(Message::Binary(report.to_vec())).await.is_err() {
                        break;
                    }
                }
                msg = receiver.next() => match msg {
                    Some(Ok(Message::Binary(data))) => match apply_gain(&state, &data) {
                        Ok(command) => tracing::debug!(
                            "[{}] Lane {} gain -> {:.2} dB",
                            conn_id,
                            command.lane_id,
                            command.gain_db
                        ),
                        Err(e) => tracing::warn!("[{}] Dropping control packet: {}", conn_id, e),
                    },
                    Some(Ok(Message::Text(_))) => {
                        tracing::warn!("[{}] Dropping control packet: {}", conn_id, PacketError::UnexpectedMessage("text"));
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // Ping/pong
                    Some(Err(e)) => {
                        tracing::debug!("[{}] Control socket error: {}", conn_id, e);
                        break;
                    }
                },
            }
        }
    }

    state.mixer.lock().unsubscribe(subscription);
    tracing::info!("[{}] Control connection closed", conn_id);
}

/// Decode a gain command and apply it
fn apply_gain(state: &AppState, raw: &[u8]) -> Result<GainModify> {
    let command = gain::decode(raw)?;
    state
        .mixer
        .lock()
        .set_lane_gain(command.lane_id, command.gain_db)?;
    Ok(command)
}
