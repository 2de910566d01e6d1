//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};

use crate::{infrastructure::sink, ui::state::AppState};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Register first so the welcome is queued before any inbound frame is read
    let (sink, mut rx) = sink::channel();
    let id = state.gateway.on_open(Arc::new(sink)).await;

    let state_clone = state.clone();

    // Spawn a task to receive messages from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    state_clone.gateway.on_error(id, e).await;
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received text from {}: {}", id, text);
                    state_clone.gateway.on_message(id, text.as_str()).await;
                }
                Message::Binary(data) => {
                    let text = String::from_utf8_lossy(&data);
                    tracing::debug!("Received binary frame from {}: {}", id, text);
                    state_clone.gateway.on_message(id, &text).await;
                }
                Message::Ping(_) | Message::Pong(_) => {
                    // Protocol-level ping/pong is answered by axum
                }
                Message::Close(_) => {
                    tracing::debug!("Connection {} sent close frame", id);
                    break;
                }
            }
        }
    });

    // Spawn a task to forward queued messages to this client
    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if let Err(e) = sender.send(Message::Text(payload.into())).await {
                tracing::warn!("Failed to write to connection {}: {}", id, e);
                break;
            }
        }
    });

    // If either task completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    }

    // No-op when the reader already cleaned up after a transport error
    state.gateway.on_close(id).await;
}
