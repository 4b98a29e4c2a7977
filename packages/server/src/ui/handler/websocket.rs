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
use tokio::sync::mpsc;

use crate::{
    domain::ClientHandle, infrastructure::dto::websocket::OutboundCommand, ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that drains the client's channel into its WebSocket sink.
///
/// Other components never touch the socket directly; they push into the
/// channel through the `MessagePusher`.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let handle = ClientHandle::generate();
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    let welcome = match OutboundCommand::identify_request().to_json() {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to encode identify request: {}", e);
            return;
        }
    };
    state
        .connect_client_usecase
        .execute(handle, tx, &welcome)
        .await;

    let state_clone = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error from '{}': {}", handle, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received from '{}': {}", handle, text.as_str());
                    let outcome = state_clone
                        .relay_message_usecase
                        .execute(&handle, text.as_str())
                        .await;
                    tracing::trace!("Relay outcome for '{}': {:?}", handle, outcome);
                }
                Message::Close(_) => {
                    tracing::debug!("Client '{}' requested close", handle);
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.disconnect_client_usecase.execute(&handle).await;
}
