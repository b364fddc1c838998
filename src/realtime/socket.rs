//! Socket lifecycle: JWT check at upgrade, frame parsing, dispatch, and the
//! scoped disconnect broadcast.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::auth::sessions::verify_token;
use crate::error::ApiError;
use crate::server::AppState;

use super::events::{voice_key, ClientEvent, ServerEvent};
use super::registry::RoomRegistry;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// GET /ws?token=<jwt>
///
/// The token is checked before the upgrade completes; a bad token never gets
/// a socket.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let claims = verify_token(&query.token)?;
    let username = claims.username.clone();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, username)))
}

async fn handle_socket(socket: WebSocket, state: AppState, username: String) {
    let registry = state.registry.clone();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let session_id = registry.register(tx);
    tracing::debug!(%session_id, %username, "socket connected");

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        let Ok(message) = frame else { break };
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => dispatch(&registry, session_id, event),
                Err(e) => {
                    tracing::debug!(%session_id, error = %e, "dropping malformed frame");
                }
            },
            Message::Close(_) => break,
            // Pings are answered by axum; binary frames are not part of the
            // protocol.
            _ => {}
        }
    }

    disconnect(&registry, session_id);
    writer.abort();
    tracing::debug!(%session_id, %username, "socket disconnected");
}

/// Route one parsed frame. Pure registry work, so tests can call it without
/// a live socket.
pub fn dispatch(registry: &RoomRegistry, session_id: Uuid, event: ClientEvent) {
    match event {
        ClientEvent::JoinChat(room_id) => {
            registry.join(session_id, &room_id);
        }
        ClientEvent::SendMessage(payload) => {
            // The payload is echoed verbatim to the whole room, sender
            // included; clients de-duplicate by message id. The durable save
            // is the independent HTTP path.
            let Some(room_id) = payload.get("roomId").and_then(|v| v.as_str()) else {
                tracing::debug!(%session_id, "send_message without roomId dropped");
                return;
            };
            let room_id = room_id.to_string();
            registry.broadcast(&room_id, &ServerEvent::ReceiveMessage(payload));
        }
        ClientEvent::JoinVoiceRoom(room_id) => {
            let key = voice_key(&room_id);
            // Tell the joiner who is already here, then announce the joiner.
            // Presence speaks in session ids only.
            registry.send_to(session_id, ServerEvent::RoomUsers(registry.members(&key)));
            registry.join(session_id, &key);
            registry.broadcast_except(
                &key,
                session_id,
                &ServerEvent::UserJoined { user_id: session_id },
            );
        }
        ClientEvent::Signal { to, signal } => {
            registry.send_to(
                to,
                ServerEvent::Signal {
                    from: session_id,
                    signal,
                },
            );
        }
    }
}

/// Drop the session and announce the departure only to the rooms it was in.
pub fn disconnect(registry: &RoomRegistry, session_id: Uuid) {
    for room in registry.unregister(session_id) {
        registry.broadcast(&room, &ServerEvent::UserDisconnected(session_id));
    }
}
