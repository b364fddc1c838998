//! HTTP and WebSocket route tables.

pub mod router;

pub use router::build_router;
