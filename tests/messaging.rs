//! Conversations, message flow, and unread bookkeeping.

mod common;

use axum_test::TestServer;
use serde_json::{json, Value};

use common::{register, test_server, TestAccount};

async fn create_direct(
    server: &TestServer,
    requester: &TestAccount,
    peer_id: &str,
) -> (u16, Value) {
    let response = server
        .post("/api/messages/conversations")
        .authorization_bearer(&requester.token)
        .json(&json!({ "participants": [peer_id] }))
        .await;
    let status = response.status_code().as_u16();
    (status, response.json())
}

async fn send(server: &TestServer, sender: &TestAccount, conversation_id: &str, content: &str) {
    let response = server
        .post(&format!("/api/messages/{conversation_id}"))
        .authorization_bearer(&sender.token)
        .json(&json!({ "content": content }))
        .await;
    assert_eq!(response.status_code(), 201, "send failed: {}", response.text());
}

#[tokio::test]
async fn direct_conversation_is_created_once_per_pair() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;

    let (status, first) = create_direct(&server, &ana, &ben.id).await;
    assert_eq!(status, 201);

    // Same pair from the other side returns the existing conversation.
    let (status, second) = create_direct(&server, &ben, &ana.id).await;
    assert_eq!(status, 200);
    assert_eq!(first["data"]["id"], second["data"]["id"]);
}

#[tokio::test]
async fn direct_conversation_exposes_the_other_participant() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;

    let (_, conversation) = create_direct(&server, &ana, &ben.id).await;
    assert_eq!(conversation["data"]["otherParticipant"]["username"], "ben");
    assert_eq!(conversation["data"]["isGroup"], false);
}

#[tokio::test]
async fn group_conversation_requires_a_name() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;
    let cat = register(&server, "cat").await;

    let response = server
        .post("/api/messages/conversations")
        .authorization_bearer(&ana.token)
        .json(&json!({
            "participants": [ben.id, cat.id],
            "isGroup": true,
        }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = server
        .post("/api/messages/conversations")
        .authorization_bearer(&ana.token)
        .json(&json!({
            "participants": [ben.id, cat.id],
            "isGroup": true,
            "name": "Tandem crew",
        }))
        .await;
    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "Tandem crew");
    assert_eq!(body["data"]["groupAdmin"], ana.id.as_str());
    assert_eq!(body["data"]["participants"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn sending_increments_unread_and_reading_resets_it() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;

    let (_, conversation) = create_direct(&server, &ana, &ben.id).await;
    let conversation_id = conversation["data"]["id"].as_str().unwrap().to_string();

    send(&server, &ana, &conversation_id, "hola").await;
    send(&server, &ana, &conversation_id, "¿cómo estás?").await;

    // Receiver sees two unread; the sender sees none.
    let body: Value = server
        .get("/api/messages/conversations")
        .authorization_bearer(&ben.token)
        .await
        .json();
    assert_eq!(body["data"][0]["unreadCount"], 2);

    let body: Value = server
        .get("/api/messages/conversations")
        .authorization_bearer(&ana.token)
        .await
        .json();
    assert_eq!(body["data"][0]["unreadCount"], 0);

    // Fetching any page of the conversation clears the whole counter.
    let response = server
        .get(&format!("/api/messages/{conversation_id}?page=1&limit=1"))
        .authorization_bearer(&ben.token)
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = server
        .get("/api/messages/conversations")
        .authorization_bearer(&ben.token)
        .await
        .json();
    assert_eq!(body["data"][0]["unreadCount"], 0);
}

#[tokio::test]
async fn messages_page_is_returned_oldest_first() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;

    let (_, conversation) = create_direct(&server, &ana, &ben.id).await;
    let conversation_id = conversation["data"]["id"].as_str().unwrap().to_string();

    for content in ["first", "second", "third"] {
        send(&server, &ana, &conversation_id, content).await;
    }

    let body: Value = server
        .get(&format!("/api/messages/{conversation_id}"))
        .authorization_bearer(&ben.token)
        .await
        .json();
    let messages = body["data"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["content"], "first");
    assert_eq!(messages[2]["content"], "third");
    assert_eq!(messages[0]["sender"]["username"], "ana");
}

#[tokio::test]
async fn page_limit_above_the_default_is_honored() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;

    let (_, conversation) = create_direct(&server, &ana, &ben.id).await;
    let conversation_id = conversation["data"]["id"].as_str().unwrap().to_string();

    for i in 0..35 {
        send(&server, &ana, &conversation_id, &format!("msg {i}")).await;
    }

    // A caller may ask for more than the 30-message default in one page.
    let body: Value = server
        .get(&format!("/api/messages/{conversation_id}?limit=500"))
        .authorization_bearer(&ben.token)
        .await
        .json();
    assert_eq!(body["count"], 35);
    assert_eq!(body["data"].as_array().unwrap().len(), 35);
}

#[tokio::test]
async fn conversation_list_carries_the_last_message() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;

    let (_, conversation) = create_direct(&server, &ana, &ben.id).await;
    let conversation_id = conversation["data"]["id"].as_str().unwrap().to_string();
    send(&server, &ana, &conversation_id, "see you at eight").await;

    let body: Value = server
        .get("/api/messages/conversations")
        .authorization_bearer(&ben.token)
        .await
        .json();
    assert_eq!(body["data"][0]["lastMessage"]["content"], "see you at eight");
}

#[tokio::test]
async fn non_participants_cannot_read_or_post() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;
    let eve = register(&server, "eve").await;

    let (_, conversation) = create_direct(&server, &ana, &ben.id).await;
    let conversation_id = conversation["data"]["id"].as_str().unwrap().to_string();

    let response = server
        .get(&format!("/api/messages/{conversation_id}"))
        .authorization_bearer(&eve.token)
        .await;
    assert_eq!(response.status_code(), 401);

    let response = server
        .post(&format!("/api/messages/{conversation_id}"))
        .authorization_bearer(&eve.token)
        .json(&json!({ "content": "let me in" }))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn only_the_sender_may_delete_a_message() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;

    let (_, conversation) = create_direct(&server, &ana, &ben.id).await;
    let conversation_id = conversation["data"]["id"].as_str().unwrap().to_string();

    let response = server
        .post(&format!("/api/messages/{conversation_id}"))
        .authorization_bearer(&ana.token)
        .json(&json!({ "content": "typo here" }))
        .await;
    let body: Value = response.json();
    let message_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = server
        .delete(&format!("/api/messages/{message_id}"))
        .authorization_bearer(&ben.token)
        .await;
    assert_eq!(response.status_code(), 401);

    let response = server
        .delete(&format!("/api/messages/{message_id}"))
        .authorization_bearer(&ana.token)
        .await;
    assert_eq!(response.status_code(), 200);

    let response = server
        .delete(&format!("/api/messages/{message_id}"))
        .authorization_bearer(&ana.token)
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn empty_message_content_is_rejected() {
    let server = test_server().await;
    let ana = register(&server, "ana").await;
    let ben = register(&server, "ben").await;

    let (_, conversation) = create_direct(&server, &ana, &ben.id).await;
    let conversation_id = conversation["data"]["id"].as_str().unwrap().to_string();

    let response = server
        .post(&format!("/api/messages/{conversation_id}"))
        .authorization_bearer(&ana.token)
        .json(&json!({ "content": "   " }))
        .await;
    assert_eq!(response.status_code(), 400);
}
