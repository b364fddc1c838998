//! HTTP handlers for conversations and messages.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::users::db as users_db;

use super::db::{self, ConversationView, MessageView};

const DEFAULT_PAGE_SIZE: i64 = 30;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub participants: Vec<String>,
    #[serde(default)]
    pub is_group: bool,
    pub name: Option<String>,
    pub main_language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub content: String,
    pub original_language: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// GET /api/messages/conversations
pub async fn get_conversations(
    State(pool): State<SqlitePool>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<ConversationView>>>, ApiError> {
    let records = db::conversations_for_user(&pool, &user.id).await?;
    let mut views = Vec::with_capacity(records.len());
    for record in &records {
        views.push(db::conversation_view(&pool, record, &user.id).await?);
    }
    let count = views.len();
    Ok(Json(ApiResponse::with_count(views, count)))
}

/// POST /api/messages/conversations
///
/// For a direct pair an existing conversation is returned instead of a
/// duplicate; groups always create and require a name.
pub async fn create_conversation(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Json(req): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ConversationView>>), ApiError> {
    let mut participants = req.participants.clone();
    if !participants.contains(&user.id) {
        participants.push(user.id.clone());
    }
    if participants.len() < 2 {
        return Err(ApiError::validation(
            "A conversation needs at least two participants",
        ));
    }
    for id in &participants {
        if users_db::get_user_by_id(&pool, id).await?.is_none() {
            return Err(ApiError::not_found(format!("User not found with id of {id}")));
        }
    }

    if req.is_group {
        let name = req
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ApiError::validation("Please provide a name for the group chat"))?;
        let record = db::create_conversation(
            &pool,
            &participants,
            true,
            Some(name),
            Some(&user.id),
            req.main_language.as_deref(),
        )
        .await?;
        let view = db::conversation_view(&pool, &record, &user.id).await?;
        return Ok((StatusCode::CREATED, Json(ApiResponse::new(view))));
    }

    if participants.len() != 2 {
        return Err(ApiError::validation(
            "A direct conversation must have exactly two participants",
        ));
    }

    if let Some(existing) = db::find_direct(&pool, &participants[0], &participants[1]).await? {
        let view = db::conversation_view(&pool, &existing, &user.id).await?;
        return Ok((StatusCode::OK, Json(ApiResponse::new(view))));
    }

    let record = db::create_conversation(
        &pool,
        &participants,
        false,
        None,
        None,
        req.main_language.as_deref(),
    )
    .await?;
    let view = db::conversation_view(&pool, &record, &user.id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(view))))
}

/// GET /api/messages/{conversationId}
///
/// Returns one page of messages oldest-first and, as a side effect, marks the
/// whole conversation read for the requester.
pub async fn get_messages(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(conversation_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<MessageView>>>, ApiError> {
    require_participant(&pool, &conversation_id, &user.id).await?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);

    let records = db::fetch_messages(&pool, &conversation_id, page, limit).await?;
    db::mark_read_and_reset_unread(&pool, &conversation_id, &user.id).await?;

    let mut views = Vec::with_capacity(records.len());
    for record in &records {
        views.push(db::message_view(&pool, record).await?);
    }
    let count = views.len();
    Ok(Json(ApiResponse::with_count(views, count)))
}

/// POST /api/messages/{conversationId}
pub async fn send_message(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(conversation_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MessageView>>), ApiError> {
    require_participant(&pool, &conversation_id, &user.id).await?;

    let record = db::send_message(
        &pool,
        &conversation_id,
        &user.id,
        &req.content,
        req.original_language.as_deref(),
        &req.attachments,
    )
    .await?;
    let view = db::message_view(&pool, &record).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(view))))
}

/// DELETE /api/messages/{id}
pub async fn delete_message(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let message = db::get_message(&pool, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Message not found with id of {id}")))?;

    if message.sender_id != user.id {
        return Err(ApiError::unauthorized("Not authorized to delete this message"));
    }

    db::delete_message(&pool, &id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": {} })))
}

async fn require_participant(
    pool: &SqlitePool,
    conversation_id: &str,
    user_id: &str,
) -> Result<(), ApiError> {
    if db::get_conversation(pool, conversation_id).await?.is_none() {
        return Err(ApiError::not_found(format!(
            "Conversation not found with id of {conversation_id}"
        )));
    }
    if !db::is_participant(pool, conversation_id, user_id).await? {
        return Err(ApiError::unauthorized(
            "Not authorized to access this conversation",
        ));
    }
    Ok(())
}
