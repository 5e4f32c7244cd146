use axum::extract::State;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::control::publisher::Publisher;
use crate::util::app_state::AppState;

pub async fn handle_status_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let publisher = state.publisher.clone();
    ws.on_upgrade(move |socket| status_handler(socket, publisher))
}

/// Pushes a status snapshot every publisher period until the client goes away.
pub async fn status_handler(socket: WebSocket, publisher: Publisher) {
    info!("WebSocket connection established");
    let (mut ws_tx, mut ws_rx) = socket.split();

    let mut subscription = publisher.subscribe();

    let forward = tokio::spawn(async move {
        while let Some(statuses) = subscription.next().await {
            let json = match serde_json::to_string(&statuses) {
                Ok(json) => json,
                Err(e) => {
                    warn!("Failed to serialize statuses: {}", e);
                    continue;
                }
            };
            if ws_tx.send(Message::Text(Utf8Bytes::from(json))).await.is_err() {
                break;
            }
            debug!("Sent status snapshot to WebSocket client");
        }
    });

    // Wait for client close or an I/O error.
    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket error: {}", e);
                break;
            }
        }
    }

    // Aborting drops the subscription, which stops its timer.
    forward.abort();
    info!("WebSocket connection closed");
}
