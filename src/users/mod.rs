//! User accounts: profiles, language preferences, connections, matching.

pub mod db;
pub mod handlers;
pub mod recommendations;

pub use db::{Proficiency, UserProfile, UserRecord};
