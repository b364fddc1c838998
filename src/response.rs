//! Success envelope shared by all handlers.
//!
//! `{"success": true, "data": ...}`, with an optional `count` on list
//! endpoints.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            count: None,
            data,
        }
    }

    pub fn with_count(data: T, count: usize) -> Self {
        Self {
            success: true,
            count: Some(count),
            data,
        }
    }
}
