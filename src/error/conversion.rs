//! `IntoResponse` for [`ApiError`].
//!
//! All failures answer with the envelope the client consumes:
//! `{"success": false, "error": "<message>"}` plus the mapped status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::types::ApiError;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {message}");
        } else {
            tracing::debug!("request rejected ({status}): {message}");
        }

        let body = serde_json::json!({
            "success": false,
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}
