//! Application state, configuration, and startup wiring.

pub mod config;
pub mod init;
pub mod state;

pub use config::Config;
pub use state::AppState;
