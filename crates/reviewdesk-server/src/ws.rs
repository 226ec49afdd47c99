//! WebSocket endpoint for live notifications.
//!
//! Each socket becomes one hub subscription. Outbound messages are written
//! from the subscription's bounded buffer; inbound frames refresh liveness
//! and `ping`/`subscribe` get their control replies.

use crate::handlers::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use reviewdesk_domain::ClientMessage;
use reviewdesk_hub::{NotificationHub, Subscription};

/// GET /ws/notifications - Upgrade to a notification stream
pub async fn notifications_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub))
}

async fn handle_socket(socket: WebSocket, hub: NotificationHub) {
    let mut subscription = match hub.subscribe() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to register connection: {}", e);
            return;
        }
    };
    let id = subscription.id();
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => handle_text(&subscription, &text),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        // Binary and transport ping/pong frames still count as liveness
                        let _ = subscription.touch();
                    }
                    Some(Err(e)) => {
                        tracing::debug!(connection = %id, "socket error: {}", e);
                        break;
                    }
                }
            }
            outbound = subscription.recv() => {
                let Some(message) = outbound else {
                    tracing::debug!(connection = %id, "subscription closed by hub");
                    break;
                };
                let json = match serde_json::to_string(&message) {
                    Ok(j) => j,
                    Err(e) => {
                        tracing::warn!(connection = %id, "failed to encode message: {}", e);
                        continue;
                    }
                };
                if sink.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    }

    let _ = sink.close().await;
    drop(subscription);
}

fn handle_text(subscription: &Subscription, text: &str) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => {
            if let Err(e) = subscription.handle_client_message(&message) {
                tracing::debug!(connection = %subscription.id(), "reply not queued: {}", e);
            }
        }
        Err(_) => {
            tracing::debug!(connection = %subscription.id(), "ignoring unrecognized frame");
            let _ = subscription.touch();
        }
    }
}
