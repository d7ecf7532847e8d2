//! Integration tests for the message endpoints.

mod helpers;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use chat_core::types::id::UserId;

#[tokio::test]
async fn test_requires_credential() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/messages/contacts", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "UNAUTHORIZED");

    let response = app
        .request("GET", "/api/messages/contacts", None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_identity_is_unauthorized() {
    let app = helpers::TestApp::new().await;
    let token = app.token_for_unknown_user();

    let response = app
        .request("GET", "/api/messages/chats", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_contacts_exclude_self() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("Alice").await;
    let bob = app.create_user("Bob").await;
    let carol = app.create_user("Carol").await;

    let response = app
        .request("GET", "/api/messages/contacts", None, Some(&alice.token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);

    let ids: Vec<String> = response
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&bob.id().to_string()));
    assert!(ids.contains(&carol.id().to_string()));
    assert!(!ids.contains(&alice.id().to_string()));
}

#[tokio::test]
async fn test_send_validation() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("Alice").await;
    let bob = app.create_user("Bob").await;

    let empty = app
        .request(
            "POST",
            &format!("/api/messages/send/{}", bob.id()),
            Some(json!({ "text": "   " })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.body["error"], "VALIDATION_ERROR");

    let to_self = app
        .request(
            "POST",
            &format!("/api/messages/send/{}", alice.id()),
            Some(json!({ "text": "hi me" })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(to_self.status, StatusCode::BAD_REQUEST);

    let unknown = app
        .request(
            "POST",
            &format!("/api/messages/send/{}", UserId::new()),
            Some(json!({ "text": "anyone?" })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let malformed = app
        .request(
            "POST",
            "/api/messages/send/not-a-uuid",
            Some(json!({ "text": "hi" })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

    assert_eq!(app.store.message_count().await, 0);
}

#[tokio::test]
async fn test_send_and_read_history() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("Alice").await;
    let bob = app.create_user("Bob").await;

    let sent = app
        .request(
            "POST",
            &format!("/api/messages/send/{}", bob.id()),
            Some(json!({ "text": " hello bob " })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(sent.status, StatusCode::CREATED);
    assert_eq!(sent.data()["text"], "hello bob");
    assert_eq!(sent.data()["read"], false);
    assert_eq!(sent.data()["senderId"], alice.id().to_string());

    tokio::time::sleep(Duration::from_millis(5)).await;
    let image_only = app
        .request(
            "POST",
            &format!("/api/messages/send/{}", alice.id()),
            Some(json!({ "image": "https://cdn.test/cat.png" })),
            Some(&bob.token),
        )
        .await;
    assert_eq!(image_only.status, StatusCode::CREATED);

    let history = app
        .request(
            "GET",
            &format!("/api/messages/{}", alice.id()),
            None,
            Some(&bob.token),
        )
        .await;
    assert_eq!(history.status, StatusCode::OK);
    let messages = history.data().as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["text"], "hello bob");
    assert_eq!(messages[1]["image"], "https://cdn.test/cat.png");
}

#[tokio::test]
async fn test_chats_sorted_with_unread_counts() {
    let app = helpers::TestApp::new().await;
    let me = app.create_user("Me").await;
    let alice = app.create_user("Alice").await;
    let bob = app.create_user("Bob").await;
    app.create_user("Carol").await;

    for (from, text) in [(&alice, "a1"), (&bob, "b1"), (&bob, "b2")] {
        let response = app
            .request(
                "POST",
                &format!("/api/messages/send/{}", me.id()),
                Some(json!({ "text": text })),
                Some(&from.token),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let chats = app
        .request("GET", "/api/messages/chats", None, Some(&me.token))
        .await;
    assert_eq!(chats.status, StatusCode::OK);
    let chats = chats.data().as_array().unwrap();
    assert_eq!(chats.len(), 2);
    assert_eq!(chats[0]["id"], bob.id().to_string());
    assert_eq!(chats[0]["unreadCount"], 2);
    assert_eq!(chats[0]["lastMessage"]["text"], "b2");
    assert_eq!(chats[1]["id"], alice.id().to_string());
    assert_eq!(chats[1]["unreadCount"], 1);
}

#[tokio::test]
async fn test_mark_as_read_flips_only_incoming_and_is_idempotent() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("Alice").await;
    let bob = app.create_user("Bob").await;

    let mut incoming = Vec::new();
    for text in ["one", "two"] {
        let response = app
            .request(
                "POST",
                &format!("/api/messages/send/{}", bob.id()),
                Some(json!({ "text": text })),
                Some(&alice.token),
            )
            .await;
        incoming.push(response.data()["id"].clone());
    }
    app.request(
        "POST",
        &format!("/api/messages/send/{}", alice.id()),
        Some(json!({ "text": "reply" })),
        Some(&bob.token),
    )
    .await;

    let first = app
        .request(
            "POST",
            &format!("/api/messages/mark-as-read/{}", alice.id()),
            None,
            Some(&bob.token),
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);
    let ids = first.data()["messageIds"].as_array().unwrap().clone();
    assert_eq!(ids.len(), 2);
    for id in &incoming {
        assert!(ids.contains(id));
    }

    let second = app
        .request(
            "POST",
            &format!("/api/messages/mark-as-read/{}", alice.id()),
            None,
            Some(&bob.token),
        )
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert!(second.data()["messageIds"].as_array().unwrap().is_empty());

    // Bob's reply to Alice is untouched.
    let history = app
        .request(
            "GET",
            &format!("/api/messages/{}", bob.id()),
            None,
            Some(&alice.token),
        )
        .await;
    let reply = history
        .data()
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["text"] == "reply")
        .cloned()
        .unwrap();
    assert_eq!(reply["read"], false);
}

#[tokio::test]
async fn test_mark_as_read_for_someone_else_is_forbidden() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("Alice").await;
    let bob = app.create_user("Bob").await;

    let response = app
        .request(
            "POST",
            &format!("/api/messages/mark-as-read/{}", alice.id()),
            Some(json!({ "readerId": alice.id() })),
            Some(&bob.token),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "FORBIDDEN");

    let own = app
        .request(
            "POST",
            &format!("/api/messages/mark-as-read/{}", alice.id()),
            Some(json!({ "readerId": bob.id() })),
            Some(&bob.token),
        )
        .await;
    assert_eq!(own.status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
    assert_eq!(response.data()["connections"], 0);

    let detailed = app.request("GET", "/api/health/detailed", None, None).await;
    assert_eq!(detailed.status, StatusCode::OK);
    assert_eq!(detailed.data()["database"], "connected");
    assert_eq!(detailed.data()["provider"], "memory");
}
