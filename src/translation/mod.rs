//! Translation proxy and message corrections.

pub mod client;
pub mod handlers;

pub use client::TranslationClient;
