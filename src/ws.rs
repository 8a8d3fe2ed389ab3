use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;

use crate::protocol::ChatEvent;
use crate::state::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::debug!("WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut session = match state.open_session().await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to register connection: {}", e);
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };
    let id = session.id.clone();

    tracing::info!("a user connected: {}", id);

    loop {
        tokio::select! {
            // Frames queued by the broadcast engine
            outbound = session.outbound.recv() => {
                match outbound {
                    Some(frame) => {
                        if sender.send(Message::Text(frame)).await.is_err() {
                            break;
                        }
                    }
                    // Registry dropped us (shutdown)
                    None => {
                        let _ = sender.send(Message::Close(None)).await;
                        break;
                    }
                }
            }

            // Handle client messages
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message from {}: {}", id, text);

                        match serde_json::from_str::<ChatEvent>(&text) {
                            Ok(ChatEvent::ChatMessage(payload)) => {
                                if let Err(e) = state.submit_message(&id, payload).await {
                                    tracing::error!("Failed to dispatch message: {}", e);
                                    break;
                                }
                            }
                            Ok(ChatEvent::Error { .. }) => {
                                tracing::debug!("Ignoring error event from client {}", id);
                            }
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                if let Ok(json) = serde_json::to_string(&ChatEvent::parse_error(&e)) {
                                    let _ = sender.send(Message::Text(json.into())).await;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::debug!("WebSocket closed by client {}", id);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("WebSocket error on {}: {}", id, e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    state.close_session(&id).await;
    tracing::info!("user disconnected: {}", id);
}
