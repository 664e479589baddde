use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;

use crate::api::ws_types::{WsMessage, DASHBOARD_KEYS};
use crate::AppState;

pub async fn handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Push invalidations to one dashboard until either side goes away.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    tracing::info!("Dashboard WebSocket client connected");

    let mut invalidations = state.query_client.subscribe();

    loop {
        tokio::select! {
            received = invalidations.recv() => {
                let messages: Vec<WsMessage> = match received {
                    Ok(key) => WsMessage::for_invalidation(key).into_iter().collect(),
                    // Some invalidations were missed; have the client refetch everything it shows.
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Dashboard WS client lagged; forcing full refetch");
                        DASHBOARD_KEYS.into_iter().map(WsMessage::Invalidated).collect()
                    }
                    Err(RecvError::Closed) => break,
                };

                if !send_all(&mut socket, &messages).await {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    // The stream is one-way.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::info!("Dashboard WebSocket client disconnected");
}

/// False once the socket is gone.
async fn send_all(socket: &mut WebSocket, messages: &[WsMessage]) -> bool {
    for msg in messages {
        let json = match serde_json::to_string(msg) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize WsMessage");
                continue;
            }
        };
        if socket.send(Message::Text(json)).await.is_err() {
            return false;
        }
    }
    true
}
