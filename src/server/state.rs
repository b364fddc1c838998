//! Shared application state.

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::realtime::RoomRegistry;
use crate::translation::TranslationClient;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub registry: RoomRegistry,
    pub translator: TranslationClient,
}

impl AppState {
    pub fn new(pool: SqlitePool, translator: TranslationClient) -> Self {
        Self {
            pool,
            registry: RoomRegistry::new(),
            translator,
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for RoomRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.registry.clone()
    }
}

impl FromRef<AppState> for TranslationClient {
    fn from_ref(state: &AppState) -> Self {
        state.translator.clone()
    }
}
