//! API error types and their HTTP conversions.
//!
//! Every failure leaving a handler goes through [`ApiError`], which maps onto
//! the status taxonomy the client expects and always serializes as
//! `{"success": false, "error": "<message>"}`.

pub mod conversion;
pub mod types;

pub use types::ApiError;
