//! Conversations, messages, and per-participant unread bookkeeping.

pub mod db;
pub mod handlers;
