//! Voice rooms: presence state machine (join, leave, mute, deafen), host
//! transfer, and auto-close on empty.

pub mod db;
pub mod handlers;

pub use db::RoomError;
