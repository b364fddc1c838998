//! WebSocket relay: chat fan-out, voice-room presence, and WebRTC signaling.

pub mod events;
pub mod registry;
pub mod socket;

pub use registry::RoomRegistry;
