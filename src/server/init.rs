//! Startup wiring: pool, migrations, seed data, and the router.

use std::str::FromStr;

use axum::Router;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::ApiError;
use crate::languages::seed::seed_languages_if_empty;
use crate::routes::build_router;
use crate::translation::TranslationClient;

use super::config::Config;
use super::state::AppState;

/// Build the full application from configuration: connect, migrate, seed,
/// and assemble the router.
pub async fn create_app(config: &Config) -> Result<Router, ApiError> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(|e| ApiError::Internal(format!("invalid DATABASE_URL: {e}")))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::info!(database = %config.database_url, "connected to database");

    let translator = TranslationClient::new(config.translate_url.clone());
    app_with_pool(pool, translator).await
}

/// Assemble the application on an existing pool. Tests use this with an
/// in-memory database.
pub async fn app_with_pool(
    pool: SqlitePool,
    translator: TranslationClient,
) -> Result<Router, ApiError> {
    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|e| ApiError::Internal(format!("migration failed: {e}")))?;
    seed_languages_if_empty(&pool).await?;

    let state = AppState::new(pool, translator);
    Ok(build_router(state))
}
