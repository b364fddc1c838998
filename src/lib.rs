//! LinguaLink backend library.
//!
//! A language-exchange service: accounts and profiles, partner matching,
//! one-to-one and group chat with translations and corrections, voice rooms,
//! and a WebSocket relay for realtime fan-out and WebRTC signaling.

pub mod auth;
pub mod error;
pub mod languages;
pub mod messaging;
pub mod middleware;
pub mod realtime;
pub mod response;
pub mod routes;
pub mod server;
pub mod translation;
pub mod users;
pub mod voice;
