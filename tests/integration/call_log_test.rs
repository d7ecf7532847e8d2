//! Integration tests for call history.

mod helpers;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_record_and_list_from_both_sides() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("Alice").await;
    let bob = app.create_user("Bob").await;

    let recorded = app
        .request(
            "POST",
            "/api/call-logs",
            Some(json!({
                "receiverId": bob.id(),
                "durationSeconds": 95,
                "outcome": "completed",
            })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(recorded.status, StatusCode::CREATED);
    assert_eq!(recorded.data()["callerId"], alice.id().to_string());
    assert_eq!(recorded.data()["durationSeconds"], 95);

    tokio::time::sleep(Duration::from_millis(5)).await;
    let missed = app
        .request(
            "POST",
            "/api/call-logs",
            Some(json!({
                "receiverId": alice.id(),
                "duration": 30,
                "status": "missed",
            })),
            Some(&bob.token),
        )
        .await;
    assert_eq!(missed.status, StatusCode::CREATED);
    assert_eq!(missed.data()["durationSeconds"], 0);

    let listed = app
        .request("GET", "/api/call-logs", None, Some(&alice.token))
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    let logs = listed.data().as_array().unwrap();
    assert_eq!(logs.len(), 2);

    assert_eq!(logs[0]["outcome"], "missed");
    assert_eq!(logs[0]["direction"], "incoming");
    assert_eq!(logs[0]["contact"]["fullName"], "Bob");
    assert_eq!(logs[1]["outcome"], "completed");
    assert_eq!(logs[1]["direction"], "outgoing");

    let bobs = app.request("GET", "/api/call-logs", None, Some(&bob.token)).await;
    let bobs = bobs.data().as_array().unwrap();
    assert_eq!(bobs[1]["direction"], "incoming");
    assert_eq!(bobs[1]["contact"]["fullName"], "Alice");
}

#[tokio::test]
async fn test_record_validation() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("Alice").await;
    let bob = app.create_user("Bob").await;

    let to_self = app
        .request(
            "POST",
            "/api/call-logs",
            Some(json!({ "receiverId": alice.id(), "outcome": "missed" })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(to_self.status, StatusCode::BAD_REQUEST);

    let bad_outcome = app
        .request(
            "POST",
            "/api/call-logs",
            Some(json!({ "receiverId": bob.id(), "outcome": "exploded" })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(bad_outcome.status, StatusCode::BAD_REQUEST);

    let negative = app
        .request(
            "POST",
            "/api/call-logs",
            Some(json!({ "receiverId": bob.id(), "durationSeconds": -1, "outcome": "completed" })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);

    let unauthenticated = app.request("GET", "/api/call-logs", None, None).await;
    assert_eq!(unauthenticated.status, StatusCode::UNAUTHORIZED);
}
