//! `WebSocket` handler for real-time live-state streaming.
//!
//! Clients connect to `GET /ws/live`. Each connection gets its own engine
//! subscription, receives a `snapshot` message with the full state, then
//! one message per published update:
//!
//! ```json
//! {"type": "carState", "data": { "car_id": 1001, ... }}
//! ```
//!
//! A slow client slows the engine down; updates are never skipped.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use racce_types::{LiveSnapshot, LiveUpdate};
use serde::Serialize;
use tracing::{debug, warn};

use crate::state::AppState;

/// Message type of the initial full-state message.
pub const SNAPSHOT_TYPE: &str = "snapshot";

#[derive(Serialize)]
struct Envelope<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    data: &'a LiveSnapshot,
}

/// Encode the initial `snapshot` message.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be serialized.
pub fn encode_snapshot(snapshot: &LiveSnapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Envelope {
        kind: SNAPSHOT_TYPE,
        data: snapshot,
    })
}

/// Encode one update as `{"type": <facet>, "data": <value>}`.
///
/// # Errors
///
/// Returns an error if the update cannot be serialized.
pub fn encode_update(update: &LiveUpdate) -> Result<String, serde_json::Error> {
    serde_json::to_string(update)
}

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming live updates.
///
/// # Route
///
/// `GET /ws/live`
pub async fn ws_live(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the `WebSocket` lifecycle: subscribe, send the snapshot, then
/// forward every update as a text frame until either side closes.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    // Subscribe before reading the snapshot so nothing falls in between.
    let mut subscription = state.live.subscribe().await;
    let snapshot = state.live.snapshot().await;
    match encode_snapshot(&snapshot) {
        Ok(json) => {
            if socket.send(Message::Text(json.into())).await.is_err() {
                debug!("WebSocket client disconnected (snapshot send failed)");
                return;
            }
        }
        Err(e) => {
            warn!("Failed to serialize live snapshot: {e}");
            return;
        }
    }

    loop {
        tokio::select! {
            update = subscription.recv() => {
                let Some(update) = update else {
                    debug!("Live state shut down, closing WebSocket");
                    let _ = socket.send(Message::Close(None)).await;
                    return;
                };
                let json = match encode_update(&update) {
                    Ok(j) => j,
                    Err(e) => {
                        warn!(facet = update.facet(), "Failed to serialize live update: {e}");
                        continue;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    debug!("WebSocket client disconnected (send failed)");
                    return;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}
