//! HTTP handlers for user profiles, language preferences, and connections.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;

use super::db::{self, Proficiency, UserProfile};
use super::recommendations::{self, Recommendation};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningLanguageInput {
    pub language: String,
    #[serde(default = "default_proficiency")]
    pub proficiency: Proficiency,
}

fn default_proficiency() -> Proficiency {
    Proficiency::Beginner
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLanguagesRequest {
    pub native_languages: Option<Vec<String>>,
    pub learning_languages: Option<Vec<LearningLanguageInput>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePictureRequest {
    pub profile_picture: String,
}

/// GET /api/users
pub async fn list_users(
    State(pool): State<SqlitePool>,
) -> Result<Json<ApiResponse<Vec<UserProfile>>>, ApiError> {
    let records = db::list_users(&pool).await?;
    let mut profiles = Vec::with_capacity(records.len());
    for record in &records {
        profiles.push(db::load_profile(&pool, record).await?);
    }
    let count = profiles.len();
    Ok(Json(ApiResponse::with_count(profiles, count)))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let record = db::get_user_by_id(&pool, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found with id of {id}")))?;
    let profile = db::load_profile(&pool, &record).await?;
    Ok(Json(ApiResponse::new(profile)))
}

/// PUT /api/users/languages
pub async fn update_languages(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Json(req): Json<UpdateLanguagesRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    if let Some(native) = &req.native_languages {
        db::set_native_languages(&pool, &user.id, native).await?;
    }
    if let Some(learning) = &req.learning_languages {
        let entries: Vec<(String, Proficiency)> = learning
            .iter()
            .map(|e| (e.language.clone(), e.proficiency))
            .collect();
        db::set_learning_languages(&pool, &user.id, &entries).await?;
    }

    let record = db::get_user_by_id(&pool, &user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let profile = db::load_profile(&pool, &record).await?;
    Ok(Json(ApiResponse::new(profile)))
}

/// GET /api/users/recommendations
pub async fn get_recommendations(
    State(pool): State<SqlitePool>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Recommendation>>>, ApiError> {
    let recommendations = recommendations::get_recommendations(&pool, &user.id).await?;
    let count = recommendations.len();
    Ok(Json(ApiResponse::with_count(recommendations, count)))
}

/// PUT /api/users/profile-picture
pub async fn update_profile_picture(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Json(req): Json<UpdateProfilePictureRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let record = db::update_profile_picture(&pool, &user.id, &req.profile_picture)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let profile = db::load_profile(&pool, &record).await?;
    Ok(Json(ApiResponse::new(profile)))
}

/// POST /api/users/connections/{id}
pub async fn add_connection(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if db::get_user_by_id(&pool, &id).await?.is_none() {
        return Err(ApiError::not_found(format!("User not found with id of {id}")));
    }
    if db::is_connected(&pool, &user.id, &id).await? {
        return Err(ApiError::validation("Already connected with this user"));
    }

    db::add_connection(&pool, &user.id, &id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Connection added successfully"
    })))
}

/// DELETE /api/users/connections/{id}
pub async fn remove_connection(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    db::remove_connection(&pool, &user.id, &id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Connection removed successfully"
    })))
}

/// GET /api/users/connections
pub async fn get_connections(
    State(pool): State<SqlitePool>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<UserProfile>>>, ApiError> {
    let ids = db::connection_ids(&pool, &user.id).await?;
    let mut profiles = Vec::with_capacity(ids.len());
    for id in &ids {
        if let Some(record) = db::get_user_by_id(&pool, id).await? {
            profiles.push(db::load_profile(&pool, &record).await?);
        }
    }
    let count = profiles.len();
    Ok(Json(ApiResponse::with_count(profiles, count)))
}
