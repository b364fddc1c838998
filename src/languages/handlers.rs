//! HTTP handlers for the language reference endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::ApiError;
use crate::response::ApiResponse;

use super::db::{self, Language};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLanguageRequest {
    pub code: String,
    pub name: String,
    pub native_name: String,
    #[serde(default)]
    pub flag: String,
    #[serde(default)]
    pub popularity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLanguageRequest {
    pub name: Option<String>,
    pub native_name: Option<String>,
    pub flag: Option<String>,
    pub popularity: Option<i64>,
}

/// GET /api/languages
pub async fn list_languages(
    State(pool): State<SqlitePool>,
) -> Result<Json<ApiResponse<Vec<Language>>>, ApiError> {
    let languages = db::list_languages(&pool).await?;
    let count = languages.len();
    Ok(Json(ApiResponse::with_count(languages, count)))
}

/// GET /api/languages/{id}
pub async fn get_language(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Language>>, ApiError> {
    let language = db::get_language(&pool, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Language not found with id of {id}")))?;
    Ok(Json(ApiResponse::new(language)))
}

/// POST /api/languages
pub async fn create_language(
    State(pool): State<SqlitePool>,
    Json(req): Json<CreateLanguageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Language>>), ApiError> {
    let language = db::create_language(
        &pool,
        &req.code,
        &req.name,
        &req.native_name,
        &req.flag,
        req.popularity,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(language))))
}

/// PUT /api/languages/{id}
pub async fn update_language(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLanguageRequest>,
) -> Result<Json<ApiResponse<Language>>, ApiError> {
    let language = db::update_language(
        &pool,
        &id,
        req.name.as_deref(),
        req.native_name.as_deref(),
        req.flag.as_deref(),
        req.popularity,
    )
    .await?
    .ok_or_else(|| ApiError::not_found(format!("Language not found with id of {id}")))?;
    Ok(Json(ApiResponse::new(language)))
}

/// DELETE /api/languages/{id}
pub async fn delete_language(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !db::delete_language(&pool, &id).await? {
        return Err(ApiError::not_found(format!(
            "Language not found with id of {id}"
        )));
    }
    Ok(Json(ApiResponse::new(serde_json::json!({}))))
}
