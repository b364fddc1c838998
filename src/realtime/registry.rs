//! In-process session and room registry.
//!
//! One entry per live socket; rooms are plain string keys (conversation ids,
//! or `voice:<id>` for voice rooms). Populated only by relay events, never
//! persisted, rebuilt empty on restart. The lock is never held across an
//! await.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use super::events::ServerEvent;

#[derive(Clone, Default)]
pub struct RoomRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

#[derive(Default)]
struct RegistryInner {
    sessions: HashMap<Uuid, Session>,
    rooms: HashMap<String, HashSet<Uuid>>,
}

struct Session {
    sender: UnboundedSender<ServerEvent>,
    rooms: HashSet<String>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a socket; the returned id names the session in signaling.
    pub fn register(&self, sender: UnboundedSender<ServerEvent>) -> Uuid {
        let id = Uuid::new_v4();
        let mut inner = self.lock();
        inner.sessions.insert(
            id,
            Session {
                sender,
                rooms: HashSet::new(),
            },
        );
        id
    }

    /// Drop a session and return the rooms it was in, so the caller can
    /// broadcast the departure to each one.
    pub fn unregister(&self, id: Uuid) -> Vec<String> {
        let mut inner = self.lock();
        let Some(session) = inner.sessions.remove(&id) else {
            return Vec::new();
        };
        let mut left = Vec::with_capacity(session.rooms.len());
        for room in session.rooms {
            if let Some(members) = inner.rooms.get_mut(&room) {
                members.remove(&id);
                if members.is_empty() {
                    inner.rooms.remove(&room);
                }
            }
            left.push(room);
        }
        left
    }

    pub fn join(&self, id: Uuid, room: &str) {
        let mut inner = self.lock();
        if let Some(session) = inner.sessions.get_mut(&id) {
            session.rooms.insert(room.to_string());
            inner.rooms.entry(room.to_string()).or_default().insert(id);
        }
    }

    pub fn members(&self, room: &str) -> Vec<Uuid> {
        self.lock()
            .rooms
            .get(room)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Send to one session. A closed channel just means the socket is going
    /// away; the disconnect path cleans it up.
    pub fn send_to(&self, id: Uuid, event: ServerEvent) {
        if let Some(session) = self.lock().sessions.get(&id) {
            let _ = session.sender.send(event);
        }
    }

    pub fn broadcast(&self, room: &str, event: &ServerEvent) {
        self.broadcast_inner(room, None, event);
    }

    pub fn broadcast_except(&self, room: &str, except: Uuid, event: &ServerEvent) {
        self.broadcast_inner(room, Some(except), event);
    }

    fn broadcast_inner(&self, room: &str, except: Option<Uuid>, event: &ServerEvent) {
        let inner = self.lock();
        let Some(members) = inner.rooms.get(room) else {
            return;
        };
        for id in members {
            if Some(*id) == except {
                continue;
            }
            if let Some(session) = inner.sessions.get(id) {
                let _ = session.sender.send(event.clone());
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryInner> {
        // Lock poisoning only happens if a holder panicked; the map is still
        // structurally sound, so keep serving.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn session(registry: &RoomRegistry) -> (Uuid, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (registry.register(tx), rx)
    }

    #[test]
    fn broadcast_reaches_every_member() {
        let registry = RoomRegistry::new();
        let (a, mut rx_a) = session(&registry);
        let (b, mut rx_b) = session(&registry);
        registry.join(a, "c1");
        registry.join(b, "c1");

        registry.broadcast(
            "c1",
            &ServerEvent::ReceiveMessage(serde_json::json!({"text": "hi"})),
        );

        assert!(matches!(rx_a.try_recv(), Ok(ServerEvent::ReceiveMessage(_))));
        assert!(matches!(rx_b.try_recv(), Ok(ServerEvent::ReceiveMessage(_))));
    }

    #[test]
    fn broadcast_except_skips_one_session() {
        let registry = RoomRegistry::new();
        let (a, mut rx_a) = session(&registry);
        let (b, mut rx_b) = session(&registry);
        registry.join(a, "voice:r1");
        registry.join(b, "voice:r1");

        registry.broadcast_except("voice:r1", a, &ServerEvent::UserJoined { user_id: b });

        assert!(rx_a.try_recv().is_err());
        assert!(matches!(rx_b.try_recv(), Ok(ServerEvent::UserJoined { .. })));
    }

    #[test]
    fn unregister_reports_joined_rooms_and_clears_membership() {
        let registry = RoomRegistry::new();
        let (a, _rx) = session(&registry);
        registry.join(a, "c1");
        registry.join(a, "voice:r1");

        let mut rooms = registry.unregister(a);
        rooms.sort();
        assert_eq!(rooms, vec!["c1".to_string(), "voice:r1".to_string()]);
        assert!(registry.members("c1").is_empty());
        assert!(registry.members("voice:r1").is_empty());
    }

    #[test]
    fn send_to_unknown_session_is_a_no_op() {
        let registry = RoomRegistry::new();
        registry.send_to(Uuid::new_v4(), ServerEvent::UserDisconnected(Uuid::new_v4()));
    }
}
