//! Authentication: JWT sessions and the account lifecycle handlers.

pub mod handlers;
pub mod sessions;

pub use sessions::{create_token, verify_token, Claims};
