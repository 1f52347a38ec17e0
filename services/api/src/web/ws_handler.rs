//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! It wires the socket to a `ScreenSession` and forwards server replies
//! produced by the session engine and its fetch tasks.

use crate::web::{
    protocol::{ClientMessage, ServerMessage},
    session::handle_client_message,
    state::{AppState, ScreenSession},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

/// The handler for upgrading HTTP requests to WebSocket connections. The
/// acting user comes from the auth middleware.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, user_id))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, user_id: Uuid) {
    info!("New WebSocket connection established for user: {}", user_id);

    let (mut sender, mut receiver) = socket.split();

    // Replies funnel through a channel so the session engine and its fetch
    // tasks never touch the socket directly; this task owns the sink.
    let (outbox, mut replies) = mpsc::unbounded_channel::<ServerMessage>();
    let forward_task = tokio::spawn(async move {
        while let Some(reply) = replies.recv().await {
            match serde_json::to_string(&reply) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        // Client is gone; stop draining.
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize server message: {}", e);
                }
            }
        }
    });

    let session_lock = Arc::new(Mutex::new(ScreenSession::new(
        user_id,
        app_state.config.page_size,
    )));

    // --- Main Message Loop ---
    loop {
        if let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        handle_client_message(&app_state, &session_lock, &outbox, client_msg)
                            .await;
                    }
                    Err(e) => {
                        warn!("Failed to deserialize client message: {}", e);
                    }
                },
                Message::Close(_) => {
                    info!("Client sent close message.");
                    break;
                }
                _ => {}
            }
        } else {
            info!("Client disconnected.");
            break;
        }
    }

    // --- Cleanup ---
    session_lock.lock().await.fetch_token.cancel();
    forward_task.abort();
    info!("WebSocket connection closed for user: {}", user_id);
}
