// =============================================================================
// WebSocket Handler — Push-based scan events
// =============================================================================
//
// Clients connect to `/api/v1/ws` and receive:
//   1. The last finished report (as a `finished` event) on connect, if any.
//   2. Every subsequent `finished` / `failed` scan event as it is published.
//
// The handler also:
//   - Responds to Ping frames with Pong frames.
//   - Tracks a per-connection sequence number that increments on every
//     outbound message.
//   - Skips ahead when the client lags behind the broadcast buffer.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::app_state::AppState;
use crate::watchlist::ScanEvent;

/// Axum handler for the WebSocket upgrade request.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    info!("WebSocket connection accepted — upgrading");
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Manages a single WebSocket connection lifecycle.
///
/// Runs two concurrent branches via `tokio::select!`:
///   1. **Push** — forward every broadcast scan event.
///   2. **Recv** — process incoming client frames (Ping/Pong, Close, text).
async fn handle_ws_connection(socket: WebSocket, state: Arc<AppState>) {
    // Subscribe before reading the latest report so nothing published in
    // between is lost.
    let mut events = state.subscribe();
    let (mut sender, mut receiver) = socket.split();
    let mut sequence: u64 = 0;

    if let Some(report) = state.latest_report() {
        if let Err(e) = send_event(&mut sender, &ScanEvent::Finished { report }, &mut sequence).await {
            warn!(error = %e, "Failed to send initial WebSocket report");
            return;
        }
    }

    loop {
        tokio::select! {
            // ── Push: forward scan events ───────────────────────────────
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if let Err(e) = send_event(&mut sender, &event, &mut sequence).await {
                            debug!(error = %e, "WebSocket send failed — disconnecting");
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "WebSocket client lagging — events skipped");
                    }
                    Err(RecvError::Closed) => {
                        info!("Scan event channel closed — disconnecting");
                        break;
                    }
                }
            }

            // ── Recv: process incoming messages ─────────────────────────
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        debug!(msg = %text, "WebSocket text message received (ignored)");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        debug!("WebSocket Ping received — sending Pong");
                        if let Err(e) = sender.send(Message::Pong(data)).await {
                            debug!(error = %e, "Failed to send Pong — disconnecting");
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        debug!("WebSocket Pong received");
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("WebSocket Close frame received — disconnecting");
                        break;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        debug!("WebSocket binary message ignored");
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket receive error — disconnecting");
                        break;
                    }
                    None => {
                        info!("WebSocket stream ended (None)");
                        break;
                    }
                }
            }
        }
    }

    info!(sent = sequence, "WebSocket connection closed");
}

/// Serialize and send one scan event.
async fn send_event<S>(sender: &mut S, event: &ScanEvent, sequence: &mut u64) -> Result<(), axum::Error>
where
    S: futures_util::Sink<Message, Error = axum::Error> + Unpin,
{
    *sequence += 1;

    match serde_json::to_string(event) {
        Ok(json) => {
            sender.send(Message::Text(json)).await?;
            debug!(seq = *sequence, "WebSocket event sent");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Failed to serialize scan event");
            // Serialisation errors are not network errors; don't disconnect.
            Ok(())
        }
    }
}
