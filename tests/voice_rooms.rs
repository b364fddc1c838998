//! Voice-room lifecycle: capacity, passwords, mute/deafen, host transfer,
//! and auto-close.

mod common;

use axum_test::TestServer;
use serde_json::{json, Value};

use common::{register, test_server, TestAccount};

async fn create_room(server: &TestServer, host: &TestAccount, body: Value) -> Value {
    let response = server
        .post("/api/voice-rooms")
        .authorization_bearer(&host.token)
        .json(&body)
        .await;
    assert_eq!(response.status_code(), 201, "create failed: {}", response.text());
    response.json()
}

#[tokio::test]
async fn host_is_the_first_participant() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;

    let room = create_room(&server, &ana, json!({ "name": "Casual Spanish" })).await;
    assert_eq!(room["data"]["host"]["username"], "ana");
    assert_eq!(room["data"]["participants"].as_array().unwrap().len(), 1);
    assert_eq!(room["data"]["participants"][0]["user"]["username"], "ana");
    assert_eq!(room["data"]["isActive"], true);
    assert_eq!(room["data"]["topic"], "casual");
    // The password must never serialize, even when unset.
    assert!(room["data"].get("password").is_none());
}

#[tokio::test]
async fn join_is_rejected_at_capacity() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;
    let cat = register(&server, "cat").await;

    let room = create_room(
        &server,
        &ana,
        json!({ "name": "Tiny room", "maxParticipants": 2 }),
    )
    .await;
    let room_id = room["data"]["id"].as_str().unwrap().to_string();

    let response = server
        .put(&format!("/api/voice-rooms/{room_id}/join"))
        .authorization_bearer(&ben.token)
        .await;
    assert_eq!(response.status_code(), 200);

    let response = server
        .put(&format!("/api/voice-rooms/{room_id}/join"))
        .authorization_bearer(&cat.token)
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "Voice room is full");
}

#[tokio::test]
async fn joining_twice_is_rejected() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;

    let room = create_room(&server, &ana, json!({ "name": "Practice" })).await;
    let room_id = room["data"]["id"].as_str().unwrap().to_string();

    server
        .put(&format!("/api/voice-rooms/{room_id}/join"))
        .authorization_bearer(&ben.token)
        .await;
    let response = server
        .put(&format!("/api/voice-rooms/{room_id}/join"))
        .authorization_bearer(&ben.token)
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn private_room_requires_the_password() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;

    let room = create_room(
        &server,
        &ana,
        json!({ "name": "Invite only", "isPrivate": true, "password": "hunter2" }),
    )
    .await;
    let room_id = room["data"]["id"].as_str().unwrap().to_string();

    let response = server
        .put(&format!("/api/voice-rooms/{room_id}/join"))
        .authorization_bearer(&ben.token)
        .await;
    assert_eq!(response.status_code(), 401);

    let response = server
        .put(&format!("/api/voice-rooms/{room_id}/join"))
        .authorization_bearer(&ben.token)
        .json(&json!({ "password": "wrong" }))
        .await;
    assert_eq!(response.status_code(), 401);

    let response = server
        .put(&format!("/api/voice-rooms/{room_id}/join"))
        .authorization_bearer(&ben.token)
        .json(&json!({ "password": "hunter2" }))
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn rejoining_a_private_room_reports_already_joined_before_the_password() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;

    let room = create_room(
        &server,
        &ana,
        json!({ "name": "Invite only", "isPrivate": true, "password": "hunter2" }),
    )
    .await;
    let room_id = room["data"]["id"].as_str().unwrap().to_string();

    let response = server
        .put(&format!("/api/voice-rooms/{room_id}/join"))
        .authorization_bearer(&ben.token)
        .json(&json!({ "password": "hunter2" }))
        .await;
    assert_eq!(response.status_code(), 200);

    // A member rejoining is already in, whatever password they send now.
    let response = server
        .put(&format!("/api/voice-rooms/{room_id}/join"))
        .authorization_bearer(&ben.token)
        .json(&json!({ "password": "wrong" }))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "Already in this voice room");

    // The host counts as a member too.
    let response = server
        .put(&format!("/api/voice-rooms/{room_id}/join"))
        .authorization_bearer(&ana.token)
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "Already in this voice room");
}

#[tokio::test]
async fn full_private_room_reports_capacity_before_the_password() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;
    let cat = register(&server, "cat").await;

    let room = create_room(
        &server,
        &ana,
        json!({
            "name": "Tiny and private",
            "isPrivate": true,
            "password": "hunter2",
            "maxParticipants": 2
        }),
    )
    .await;
    let room_id = room["data"]["id"].as_str().unwrap().to_string();

    let response = server
        .put(&format!("/api/voice-rooms/{room_id}/join"))
        .authorization_bearer(&ben.token)
        .json(&json!({ "password": "hunter2" }))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = server
        .put(&format!("/api/voice-rooms/{room_id}/join"))
        .authorization_bearer(&cat.token)
        .json(&json!({ "password": "wrong" }))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "Voice room is full");
}

#[tokio::test]
async fn private_room_without_password_is_rejected_at_creation() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;

    let response = server
        .post("/api/voice-rooms")
        .authorization_bearer(&ana.token)
        .json(&json!({ "name": "Invite only", "isPrivate": true }))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn deafen_forces_mute_and_undeafen_unmutes() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;

    let room = create_room(&server, &ana, json!({ "name": "Quiet corner" })).await;
    let room_id = room["data"]["id"].as_str().unwrap().to_string();

    let body: Value = server
        .put(&format!("/api/voice-rooms/{room_id}/toggle-deafen"))
        .authorization_bearer(&ana.token)
        .await
        .json();
    assert_eq!(body["data"]["isDeafened"], true);
    assert_eq!(body["data"]["isMuted"], true);

    // Undeafen unmutes even though mute was switched on along the way.
    let body: Value = server
        .put(&format!("/api/voice-rooms/{room_id}/toggle-deafen"))
        .authorization_bearer(&ana.token)
        .await
        .json();
    assert_eq!(body["data"]["isDeafened"], false);
    assert_eq!(body["data"]["isMuted"], false);
}

#[tokio::test]
async fn mute_toggles_independently() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;

    let room = create_room(&server, &ana, json!({ "name": "Practice" })).await;
    let room_id = room["data"]["id"].as_str().unwrap().to_string();

    let body: Value = server
        .put(&format!("/api/voice-rooms/{room_id}/toggle-mute"))
        .authorization_bearer(&ana.token)
        .await
        .json();
    assert_eq!(body["data"]["isMuted"], true);

    let body: Value = server
        .put(&format!("/api/voice-rooms/{room_id}/toggle-mute"))
        .authorization_bearer(&ana.token)
        .await
        .json();
    assert_eq!(body["data"]["isMuted"], false);
}

#[tokio::test]
async fn host_leaving_hands_the_room_to_the_earliest_joiner() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;
    let cat = register(&server, "cat").await;

    let room = create_room(&server, &ana, json!({ "name": "Practice" })).await;
    let room_id = room["data"]["id"].as_str().unwrap().to_string();

    server
        .put(&format!("/api/voice-rooms/{room_id}/join"))
        .authorization_bearer(&ben.token)
        .await;
    server
        .put(&format!("/api/voice-rooms/{room_id}/join"))
        .authorization_bearer(&cat.token)
        .await;

    let response = server
        .put(&format!("/api/voice-rooms/{room_id}/leave"))
        .authorization_bearer(&ana.token)
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["data"]["host"]["username"], "ben");
    assert_eq!(body["data"]["isActive"], true);
}

#[tokio::test]
async fn last_participant_leaving_closes_the_room() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;

    let room = create_room(&server, &ana, json!({ "name": "Short lived" })).await;
    let room_id = room["data"]["id"].as_str().unwrap().to_string();

    let response = server
        .put(&format!("/api/voice-rooms/{room_id}/leave"))
        .authorization_bearer(&ana.token)
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["data"]["isActive"], false);
    assert!(body["data"]["endTime"].is_string());

    // Closed rooms disappear from listing and direct lookups.
    let body: Value = server
        .get("/api/voice-rooms")
        .authorization_bearer(&ana.token)
        .await
        .json();
    assert_eq!(body["count"], 0);

    let response = server
        .get(&format!("/api/voice-rooms/{room_id}"))
        .authorization_bearer(&ana.token)
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn leaving_a_room_you_are_not_in_is_rejected() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;

    let room = create_room(&server, &ana, json!({ "name": "Practice" })).await;
    let room_id = room["data"]["id"].as_str().unwrap().to_string();

    let response = server
        .put(&format!("/api/voice-rooms/{room_id}/leave"))
        .authorization_bearer(&ben.token)
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn only_the_host_may_update_or_delete_the_room() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;

    let room = create_room(&server, &ana, json!({ "name": "Practice" })).await;
    let room_id = room["data"]["id"].as_str().unwrap().to_string();

    let response = server
        .put(&format!("/api/voice-rooms/{room_id}"))
        .authorization_bearer(&ben.token)
        .json(&json!({ "name": "Hijacked" }))
        .await;
    assert_eq!(response.status_code(), 401);

    let response = server
        .delete(&format!("/api/voice-rooms/{room_id}"))
        .authorization_bearer(&ben.token)
        .await;
    assert_eq!(response.status_code(), 401);

    let response = server
        .put(&format!("/api/voice-rooms/{room_id}"))
        .authorization_bearer(&ana.token)
        .json(&json!({ "name": "Renamed", "topic": "grammar" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "Renamed");
    assert_eq!(body["data"]["topic"], "grammar");
    // Host and participants are not editable through updates.
    assert_eq!(body["data"]["host"]["username"], "ana");

    let response = server
        .delete(&format!("/api/voice-rooms/{room_id}"))
        .authorization_bearer(&ana.token)
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn capacity_cannot_drop_below_current_occupancy() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;

    let room = create_room(
        &server,
        &ana,
        json!({ "name": "Practice", "maxParticipants": 5 }),
    )
    .await;
    let room_id = room["data"]["id"].as_str().unwrap().to_string();

    server
        .put(&format!("/api/voice-rooms/{room_id}/join"))
        .authorization_bearer(&ben.token)
        .await;

    // Two people are in; the limit cannot shrink past them.
    let response = server
        .put(&format!("/api/voice-rooms/{room_id}"))
        .authorization_bearer(&ana.token)
        .json(&json!({ "maxParticipants": 1 }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = server
        .put(&format!("/api/voice-rooms/{room_id}"))
        .authorization_bearer(&ana.token)
        .json(&json!({ "maxParticipants": 2 }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["data"]["maxParticipants"], 2);
}

#[tokio::test]
async fn room_languages_come_from_the_reference_table() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let spanish = common::language_id(&server, "es").await;

    let room = create_room(
        &server,
        &ana,
        json!({ "name": "Español", "languages": [spanish] }),
    )
    .await;
    assert_eq!(room["data"]["languages"][0]["code"], "es");
}
