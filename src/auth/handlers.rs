//! Account lifecycle handlers: register, login, logout, profile and password
//! maintenance, and the reset-token flow.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::error::{types::is_unique_violation, ApiError};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::users::db::{self as users_db, DetailsUpdate, UserProfile};

use super::sessions::create_token;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDetailsRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub interests: Option<Vec<String>>,
    pub location: Option<LocationInput>,
}

#[derive(Debug, Deserialize)]
pub struct LocationInput {
    pub country: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

/// Token response shape consumed by the client: `{success, token, user}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: AuthUserSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    pub profile_picture: String,
}

fn token_response(user: &users_db::UserRecord) -> Result<AuthResponse, ApiError> {
    let token = create_token(&user.id, &user.username)
        .map_err(|e| ApiError::Internal(format!("token creation failed: {e}")))?;
    Ok(AuthResponse {
        success: true,
        token,
        user: AuthUserSummary {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            profile_picture: user.profile_picture.clone(),
        },
    })
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// POST /api/auth/register
pub async fn register(
    State(pool): State<SqlitePool>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    if req.username.trim().is_empty() || req.email.trim().is_empty() {
        return Err(ApiError::validation("Please provide a username and email"));
    }
    if req.password.len() < 6 {
        return Err(ApiError::validation(
            "Password must be at least 6 characters long",
        ));
    }

    let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)?;
    let user = users_db::create_user(&pool, req.username.trim(), req.email.trim(), &password_hash)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict("Email or username already exists. Please use a different one.")
            } else {
                ApiError::from(e)
            }
        })?;

    tracing::info!("registered user {}", user.username);
    Ok((StatusCode::CREATED, Json(token_response(&user)?)))
}

/// POST /api/auth/login
pub async fn login(
    State(pool): State<SqlitePool>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Please provide an email and password"));
    }

    let user = users_db::get_user_by_email(&pool, &req.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let valid = bcrypt::verify(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    users_db::set_online(&pool, &user.id, true).await?;
    tracing::info!("user logged in: {}", user.username);
    Ok(Json(token_response(&user)?))
}

/// GET /api/auth/logout
pub async fn logout(
    State(pool): State<SqlitePool>,
    user: AuthUser,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    users_db::set_online(&pool, &user.id, false).await?;
    Ok(Json(ApiResponse::new(serde_json::json!({}))))
}

/// GET /api/auth/me
pub async fn get_me(
    State(pool): State<SqlitePool>,
    user: AuthUser,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let record = users_db::get_user_by_id(&pool, &user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let profile = users_db::load_profile(&pool, &record).await?;
    Ok(Json(ApiResponse::new(profile)))
}

/// PUT /api/auth/updatedetails
pub async fn update_details(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Json(req): Json<UpdateDetailsRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let (country, city) = match &req.location {
        Some(loc) => (loc.country.as_deref(), loc.city.as_deref()),
        None => (None, None),
    };

    let record = users_db::update_details(
        &pool,
        &user.id,
        DetailsUpdate {
            username: req.username.as_deref(),
            email: req.email.as_deref(),
            bio: req.bio.as_deref(),
            interests: req.interests.as_deref(),
            country,
            city,
        },
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::conflict("Email or username already exists. Please use a different one.")
        } else {
            ApiError::from(e)
        }
    })?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    let profile = users_db::load_profile(&pool, &record).await?;
    Ok(Json(ApiResponse::new(profile)))
}

/// PUT /api/auth/updatepassword
pub async fn update_password(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let record = users_db::get_user_by_id(&pool, &user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !bcrypt::verify(&req.current_password, &record.password_hash)? {
        return Err(ApiError::unauthorized("Password is incorrect"));
    }
    if req.new_password.len() < 6 {
        return Err(ApiError::validation(
            "Password must be at least 6 characters long",
        ));
    }

    let new_hash = bcrypt::hash(&req.new_password, bcrypt::DEFAULT_COST)?;
    users_db::update_password_hash(&pool, &user.id, &new_hash).await?;
    Ok(Json(token_response(&record)?))
}

/// POST /api/auth/forgotpassword
///
/// Stores a SHA-256 digest of the reset token with a 10-minute expiry and
/// returns the raw token in the response body in place of sending email.
pub async fn forgot_password(
    State(pool): State<SqlitePool>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = users_db::get_user_by_email(&pool, &req.email)
        .await?
        .ok_or_else(|| ApiError::not_found("There is no user with that email"))?;

    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    let reset_token = hex::encode(bytes);

    users_db::set_reset_token(
        &pool,
        &user.id,
        &sha256_hex(&reset_token),
        Utc::now() + Duration::minutes(10),
    )
    .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "resetToken": reset_token,
    })))
}

/// PUT /api/auth/resetpassword/{token}
pub async fn reset_password(
    State(pool): State<SqlitePool>,
    Path(token): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = users_db::find_by_reset_token(&pool, &sha256_hex(&token))
        .await?
        .ok_or_else(|| ApiError::validation("Invalid token"))?;

    if req.password.len() < 6 {
        return Err(ApiError::validation(
            "Password must be at least 6 characters long",
        ));
    }

    let new_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)?;
    users_db::update_password_hash(&pool, &user.id, &new_hash).await?;
    users_db::clear_reset_token(&pool, &user.id).await?;

    Ok(Json(token_response(&user)?))
}
