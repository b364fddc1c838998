//! Shared harness: in-memory database, app assembly, and account helpers.

// Not every suite uses every helper.
#![allow(dead_code)]

use axum_test::TestServer;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;

use lingualink::server::init::app_with_pool;
use lingualink::translation::TranslationClient;

/// App over a fresh in-memory database. One connection keeps every query on
/// the same database.
pub async fn test_server() -> TestServer {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    // Point the translator at a closed port so upstream calls fail fast.
    let translator = TranslationClient::new(Some("http://127.0.0.1:9".to_string()));
    let app = app_with_pool(pool, translator).await.unwrap();
    TestServer::new(app).unwrap()
}

pub struct TestAccount {
    pub id: String,
    pub token: String,
}

pub async fn register(server: &TestServer, username: &str) -> TestAccount {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "secret123",
        }))
        .await;
    assert_eq!(response.status_code(), 201, "register failed: {}", response.text());

    let body: Value = response.json();
    TestAccount {
        id: body["user"]["id"].as_str().unwrap().to_string(),
        token: body["token"].as_str().unwrap().to_string(),
    }
}

/// Language id from the seeded reference table, by code.
pub async fn language_id(server: &TestServer, code: &str) -> String {
    let body: Value = server.get("/api/languages").await.json();
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["code"] == code)
        .unwrap_or_else(|| panic!("language {code} not seeded"))["id"]
        .as_str()
        .unwrap()
        .to_string()
}
