//! Bearer-token authentication middleware.
//!
//! Verifies the JWT from the `Authorization` header, confirms the user still
//! exists, bumps their `lastActive` marker, and attaches
//! an [`AuthUser`] to the request extensions for handlers to extract.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::sessions::verify_token;
use crate::error::ApiError;
use crate::server::state::AppState;
use crate::users::db as users_db;

/// The authenticated caller, resolved from the bearer token.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::unauthorized("Not authorized to access this route"))?;

    let claims = verify_token(token)?;

    let user = users_db::get_user_by_id(&state.pool, &claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    users_db::touch_last_active(&state.pool, &user.id).await?;

    request.extensions_mut().insert(AuthUser {
        id: user.id,
        username: user.username,
    });

    Ok(next.run(request).await)
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Not authorized to access this route"))
    }
}
