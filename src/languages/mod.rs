//! Language reference data: CRUD over the seeded language table.

pub mod db;
pub mod handlers;
pub mod seed;

pub use db::Language;
