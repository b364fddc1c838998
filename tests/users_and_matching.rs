//! Profiles, language preferences, partner matching, and connections.

mod common;

use axum_test::TestServer;
use serde_json::{json, Value};

use common::{language_id, register, test_server, TestAccount};

async fn set_languages(
    server: &TestServer,
    account: &TestAccount,
    native: &[&str],
    learning: &[&str],
) {
    let response = server
        .put("/api/users/languages")
        .authorization_bearer(&account.token)
        .json(&json!({
            "nativeLanguages": native,
            "learningLanguages": learning
                .iter()
                .map(|id| json!({ "language": id, "proficiency": "beginner" }))
                .collect::<Vec<_>>(),
        }))
        .await;
    assert_eq!(response.status_code(), 200, "set languages: {}", response.text());
}

#[tokio::test]
async fn language_preferences_round_trip_through_the_profile() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let english = language_id(&server, "en").await;
    let spanish = language_id(&server, "es").await;

    set_languages(&server, &ana, &[&english], &[&spanish]).await;

    let body: Value = server
        .get("/api/auth/me")
        .authorization_bearer(&ana.token)
        .await
        .json();
    assert_eq!(body["data"]["nativeLanguages"][0]["code"], "en");
    assert_eq!(body["data"]["learningLanguages"][0]["language"]["code"], "es");
    assert_eq!(body["data"]["learningLanguages"][0]["proficiency"], "beginner");
}

#[tokio::test]
async fn reciprocal_learners_match_with_the_highest_score() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;
    let cat = register(&server, "cat").await;

    let english = language_id(&server, "en").await;
    let spanish = language_id(&server, "es").await;
    let german = language_id(&server, "de").await;

    // ben mirrors ana exactly; cat only shares one direction.
    set_languages(&server, &ana, &[&english], &[&spanish]).await;
    set_languages(&server, &ben, &[&spanish], &[&english]).await;
    set_languages(&server, &cat, &[&spanish], &[&german]).await;

    let body: Value = server
        .get("/api/users/recommendations")
        .authorization_bearer(&ana.token)
        .await
        .json();
    let recommendations = body["data"].as_array().unwrap();
    assert_eq!(recommendations.len(), 2);
    assert_eq!(recommendations[0]["user"]["username"], "ben");
    assert_eq!(recommendations[0]["matchScore"], 2);
    assert_eq!(recommendations[1]["user"]["username"], "cat");
    assert_eq!(recommendations[1]["matchScore"], 1);
}

#[tokio::test]
async fn users_without_overlap_are_not_recommended() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;

    let english = language_id(&server, "en").await;
    let spanish = language_id(&server, "es").await;
    let german = language_id(&server, "de").await;
    let french = language_id(&server, "fr").await;

    set_languages(&server, &ana, &[&english], &[&spanish]).await;
    set_languages(&server, &ben, &[&german], &[&french]).await;

    let body: Value = server
        .get("/api/users/recommendations")
        .authorization_bearer(&ana.token)
        .await
        .json();
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn connections_are_symmetric() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;

    let response = server
        .post(&format!("/api/users/connections/{}", ben.id))
        .authorization_bearer(&ana.token)
        .await;
    assert_eq!(response.status_code(), 200);

    // Both sides see the link.
    let body: Value = server
        .get("/api/users/connections")
        .authorization_bearer(&ana.token)
        .await
        .json();
    assert_eq!(body["data"][0]["username"], "ben");

    let body: Value = server
        .get("/api/users/connections")
        .authorization_bearer(&ben.token)
        .await
        .json();
    assert_eq!(body["data"][0]["username"], "ana");

    // Duplicate connects are rejected, removal clears both directions.
    let response = server
        .post(&format!("/api/users/connections/{}", ben.id))
        .authorization_bearer(&ana.token)
        .await;
    assert_eq!(response.status_code(), 400);

    let response = server
        .delete(&format!("/api/users/connections/{}", ana.id))
        .authorization_bearer(&ben.token)
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = server
        .get("/api/users/connections")
        .authorization_bearer(&ana.token)
        .await
        .json();
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn connecting_to_an_unknown_user_is_not_found() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;

    let response = server
        .post("/api/users/connections/no-such-user")
        .authorization_bearer(&ana.token)
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn user_listing_reports_a_count() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    register(&server, "ben").await;

    let body: Value = server
        .get("/api/users")
        .authorization_bearer(&ana.token)
        .await
        .json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_user_lookup_is_not_found() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;

    let response = server
        .get("/api/users/missing-id")
        .authorization_bearer(&ana.token)
        .await;
    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["error"], "User not found with id of missing-id");
}
