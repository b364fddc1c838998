//! HTTP handlers for voice rooms.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;

use super::db::{self, NewRoom, RoomError, RoomRecord, RoomUpdate, RoomView};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub is_private: bool,
    pub password: Option<String>,
    pub max_participants: Option<i64>,
    pub topic: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoomRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub languages: Option<Vec<String>>,
    pub is_private: Option<bool>,
    pub password: Option<String>,
    pub max_participants: Option<i64>,
    pub topic: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinRoomRequest {
    pub password: Option<String>,
}

/// GET /api/voice-rooms
pub async fn list_rooms(
    State(pool): State<SqlitePool>,
) -> Result<Json<ApiResponse<Vec<RoomView>>>, ApiError> {
    let records = db::list_active_rooms(&pool).await?;
    let mut views = Vec::with_capacity(records.len());
    for record in &records {
        views.push(db::room_view(&pool, record).await?);
    }
    let count = views.len();
    Ok(Json(ApiResponse::with_count(views, count)))
}

/// GET /api/voice-rooms/{id}
pub async fn get_room(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RoomView>>, ApiError> {
    let record = find_room(&pool, &id).await?;
    let view = db::room_view(&pool, &record).await?;
    Ok(Json(ApiResponse::new(view)))
}

/// POST /api/voice-rooms
pub async fn create_room(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Json(req): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RoomView>>), ApiError> {
    let record = db::create_room(
        &pool,
        NewRoom {
            name: &req.name,
            description: req.description.as_deref(),
            host_id: &user.id,
            language_ids: &req.languages,
            is_private: req.is_private,
            password: req.password.as_deref(),
            max_participants: req.max_participants,
            topic: req.topic.as_deref(),
        },
    )
    .await?;
    tracing::info!(room = %record.id, host = %user.username, "voice room created");
    let view = db::room_view(&pool, &record).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(view))))
}

/// PUT /api/voice-rooms/{id} (host only)
pub async fn update_room(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateRoomRequest>,
) -> Result<Json<ApiResponse<RoomView>>, ApiError> {
    let record = find_room(&pool, &id).await?;
    if record.host_id != user.id {
        return Err(RoomError::NotAuthorized.into());
    }

    let record = db::update_room(
        &pool,
        &id,
        RoomUpdate {
            name: req.name.as_deref(),
            description: req.description.as_deref(),
            language_ids: req.languages.as_deref(),
            is_private: req.is_private,
            password: req.password.as_deref(),
            max_participants: req.max_participants,
            topic: req.topic.as_deref(),
        },
    )
    .await?;
    let view = db::room_view(&pool, &record).await?;
    Ok(Json(ApiResponse::new(view)))
}

/// DELETE /api/voice-rooms/{id} (host only)
pub async fn delete_room(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = find_room(&pool, &id).await?;
    if record.host_id != user.id {
        return Err(RoomError::NotAuthorized.into());
    }

    db::delete_room(&pool, &id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": {} })))
}

/// PUT /api/voice-rooms/{id}/join
pub async fn join_room(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Option<Json<JoinRoomRequest>>,
) -> Result<Json<ApiResponse<RoomView>>, ApiError> {
    let record = find_room(&pool, &id).await?;
    let Json(req) = body.unwrap_or_default();

    db::join_room(&pool, &record, &user.id, req.password.as_deref()).await?;
    tracing::debug!(room = %id, user = %user.username, "joined voice room");

    let record = find_room(&pool, &id).await?;
    let view = db::room_view(&pool, &record).await?;
    Ok(Json(ApiResponse::new(view)))
}

/// PUT /api/voice-rooms/{id}/leave
pub async fn leave_room(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RoomView>>, ApiError> {
    let record = find_room(&pool, &id).await?;
    db::leave_room(&pool, &record, &user.id).await?;
    tracing::debug!(room = %id, user = %user.username, "left voice room");

    // Re-read after the transition; the room may now be closed or rehosted.
    let record = db::get_room(&pool, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Voice room not found with id of {id}")))?;
    let view = db::room_view(&pool, &record).await?;
    Ok(Json(ApiResponse::new(view)))
}

/// PUT /api/voice-rooms/{id}/toggle-mute
pub async fn toggle_mute(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    find_room(&pool, &id).await?;
    let is_muted = db::toggle_mute(&pool, &id, &user.id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": { "isMuted": is_muted }
    })))
}

/// PUT /api/voice-rooms/{id}/toggle-deafen
pub async fn toggle_deafen(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    find_room(&pool, &id).await?;
    let (is_deafened, is_muted) = db::toggle_deafen(&pool, &id, &user.id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": { "isDeafened": is_deafened, "isMuted": is_muted }
    })))
}

/// Closed rooms are invisible: joining or inspecting one is a 404.
async fn find_room(pool: &SqlitePool, id: &str) -> Result<RoomRecord, ApiError> {
    let record = db::get_room(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Voice room not found with id of {id}")))?;
    if !record.is_active {
        return Err(ApiError::not_found(format!("Voice room not found with id of {id}")));
    }
    Ok(record)
}
