//! Wire events for the relay.
//!
//! Every frame is a JSON object `{"event": ..., "data": ...}`. Unknown or
//! malformed frames are rejected at the connection boundary and never reach
//! the dispatcher.
//!
//! Presence events carry transport-session identifiers only; the relay never
//! resolves them to user identities.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Frames a client may send.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Subscribe this session to a conversation's fan-out.
    JoinChat(String),
    /// Relay a message payload to everyone in its room, sender included
    /// (clients de-duplicate by message id). The payload must carry `roomId`;
    /// it is otherwise passed through verbatim.
    SendMessage(serde_json::Value),
    /// Subscribe to a voice room's presence and signaling.
    JoinVoiceRoom(String),
    /// WebRTC signaling addressed to one peer session.
    Signal {
        to: Uuid,
        signal: serde_json::Value,
    },
}

/// Frames the relay sends. `users:online` is a reserved contract point with
/// no producer; it deliberately has no variant here.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Verbatim echo of a relayed message payload.
    ReceiveMessage(serde_json::Value),
    UserJoined {
        #[serde(rename = "userId")]
        user_id: Uuid,
    },
    /// Sent to a voice-room joiner: the sessions already present, self
    /// excluded.
    RoomUsers(Vec<Uuid>),
    Signal {
        from: Uuid,
        signal: serde_json::Value,
    },
    UserDisconnected(Uuid),
}

/// Registry key for a voice room, kept distinct from conversation keys.
pub fn voice_key(room_id: &str) -> String {
    format!("voice:{room_id}")
}
