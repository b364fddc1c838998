//! HTTP handlers for the translation proxy and message corrections.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::ApiError;
use crate::messaging::db as messages_db;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectTranslationRequest {
    pub language_id: String,
    pub corrected_content: String,
}

/// POST /api/translations/translate
pub async fn translate(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<TranslateRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let text = req
        .text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::validation("Please provide text to translate"))?;
    let to = req
        .to
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::validation("Please provide a target language"))?;

    let translated = state
        .translator
        .translate(text, req.from.as_deref(), to)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "data": {
            "original": text,
            "translated": translated,
            "from": req.from.as_deref().unwrap_or("auto"),
            "to": to,
        }
    })))
}

/// POST /api/translations/correct/{messageId}
///
/// Records a native speaker's correction on a message's translation for the
/// given language, overwriting any previous correction.
pub async fn correct_translation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(message_id): Path<String>,
    Json(req): Json<CorrectTranslationRequest>,
) -> Result<Json<ApiResponse<messages_db::MessageView>>, ApiError> {
    if req.corrected_content.trim().is_empty() {
        return Err(ApiError::validation("Please provide the corrected text"));
    }

    let pool: &SqlitePool = &state.pool;
    let message = messages_db::get_message(pool, &message_id)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!("Message not found with id of {message_id}"))
        })?;

    if !messages_db::is_participant(pool, &message.conversation_id, &user.id).await? {
        return Err(ApiError::unauthorized(
            "Not authorized to access this conversation",
        ));
    }

    messages_db::upsert_translation_correction(
        pool,
        &message_id,
        &req.language_id,
        &user.id,
        req.corrected_content.trim(),
    )
    .await?;

    let view = messages_db::message_view(pool, &message).await?;
    Ok(Json(ApiResponse::new(view)))
}

/// GET /api/translations/languages
pub async fn supported_languages(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let languages = state.translator.supported_languages().await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": languages,
    })))
}
