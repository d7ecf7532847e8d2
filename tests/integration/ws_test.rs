//! Integration tests for the relay WebSocket.

mod helpers;

use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(addr: SocketAddr, token: &str) -> Ws {
    let mut request = format!("ws://{addr}/ws")
        .into_client_request()
        .expect("request");
    request.headers_mut().insert(
        "Authorization",
        HeaderValue::from_str(&format!("Bearer {token}")).expect("header"),
    );
    let (ws, _) = connect_async(request).await.expect("Failed to connect");
    ws
}

/// Next non-ping event, or `None` if the socket closed.
async fn next_event(ws: &mut Ws) -> Option<Value> {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("Timed out waiting for relay event")?;
        match frame {
            Ok(Message::Text(text)) => {
                let value: Value = serde_json::from_str(text.as_str()).expect("JSON frame");
                if value["event"] != "ping" {
                    return Some(value);
                }
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// Skip events until one named `name` arrives.
async fn expect_event(ws: &mut Ws, name: &str) -> Value {
    loop {
        let event = next_event(ws)
            .await
            .unwrap_or_else(|| panic!("Socket closed while waiting for {name}"));
        if event["event"] == name {
            return event["data"].clone();
        }
    }
}

/// Wait for an online set equal to `expected`.
async fn expect_online(ws: &mut Ws, expected: &[&helpers::TestUser]) {
    let expected: HashSet<String> = expected.iter().map(|u| u.id().to_string()).collect();
    loop {
        let data = expect_event(ws, "getOnlineUsers").await;
        let online: HashSet<String> = data
            .as_array()
            .expect("array")
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        if online == expected {
            return;
        }
    }
}

async fn send(ws: &mut Ws, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("send");
}

#[tokio::test]
async fn test_handshake_without_credential_is_refused() {
    let app = helpers::TestApp::new().await;
    let addr = app.spawn_server().await;

    match connect_async(format!("ws://{addr}/ws")).await {
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
            assert_eq!(response.status().as_u16(), 401);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("handshake without credential succeeded"),
    }
    assert_eq!(app.state.realtime.registry.connection_count(), 0);
}

#[tokio::test]
async fn test_query_token_and_cookie_are_accepted() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("Alice").await;
    let addr = app.spawn_server().await;

    let (mut by_query, _) = connect_async(format!("ws://{addr}/ws?token={}", alice.token))
        .await
        .expect("query token");
    expect_online(&mut by_query, &[&alice]).await;

    let mut request = format!("ws://{addr}/ws").into_client_request().unwrap();
    request.headers_mut().insert(
        "Cookie",
        HeaderValue::from_str(&format!("theme=dark; jwt={}", alice.token)).unwrap(),
    );
    let (mut by_cookie, _) = connect_async(request).await.expect("cookie");
    expect_online(&mut by_cookie, &[&alice]).await;
}

#[tokio::test]
async fn test_presence_broadcasts_follow_connections() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("Alice").await;
    let bob = app.create_user("Bob").await;
    let addr = app.spawn_server().await;

    let mut alice_ws = connect(addr, &alice.token).await;
    expect_online(&mut alice_ws, &[&alice]).await;

    let mut bob_ws = connect(addr, &bob.token).await;
    expect_online(&mut bob_ws, &[&alice, &bob]).await;
    expect_online(&mut alice_ws, &[&alice, &bob]).await;

    bob_ws.close(None).await.expect("close");
    expect_online(&mut alice_ws, &[&alice]).await;

    send(&mut alice_ws, json!({ "event": "requestOnlineUsers" })).await;
    expect_online(&mut alice_ws, &[&alice]).await;
}

#[tokio::test]
async fn test_new_message_and_read_receipt_push() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("Alice").await;
    let bob = app.create_user("Bob").await;
    let addr = app.spawn_server().await;

    let mut alice_ws = connect(addr, &alice.token).await;
    let mut bob_ws = connect(addr, &bob.token).await;
    expect_online(&mut alice_ws, &[&alice, &bob]).await;
    expect_online(&mut bob_ws, &[&alice, &bob]).await;

    let sent = app
        .request(
            "POST",
            &format!("/api/messages/send/{}", bob.id()),
            Some(json!({ "text": "hi bob" })),
            Some(&alice.token),
        )
        .await;
    let message_id = sent.data()["id"].clone();

    let pushed = expect_event(&mut bob_ws, "newMessage").await;
    assert_eq!(pushed["id"], message_id);
    assert_eq!(pushed["text"], "hi bob");
    let echoed = expect_event(&mut alice_ws, "newMessage").await;
    assert_eq!(echoed["id"], message_id);

    app.request(
        "POST",
        &format!("/api/messages/mark-as-read/{}", alice.id()),
        None,
        Some(&bob.token),
    )
    .await;

    let receipt = expect_event(&mut alice_ws, "messageRead").await;
    assert_eq!(receipt["userId"], bob.id().to_string());
    assert_eq!(receipt["messageIds"], json!([message_id]));
}

#[tokio::test]
async fn test_typing_is_relayed() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("Alice").await;
    let bob = app.create_user("Bob").await;
    let addr = app.spawn_server().await;

    let mut alice_ws = connect(addr, &alice.token).await;
    let mut bob_ws = connect(addr, &bob.token).await;
    expect_online(&mut bob_ws, &[&alice, &bob]).await;

    send(
        &mut alice_ws,
        json!({ "event": "typing", "data": { "receiverId": bob.id(), "isTyping": true } }),
    )
    .await;
    let typing = expect_event(&mut bob_ws, "userTyping").await;
    assert_eq!(typing, json!({ "userId": alice.id(), "isTyping": true }));
}

#[tokio::test]
async fn test_call_to_offline_user_fails() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("Alice").await;
    let bob = app.create_user("Bob").await;
    let addr = app.spawn_server().await;

    let mut alice_ws = connect(addr, &alice.token).await;
    expect_online(&mut alice_ws, &[&alice]).await;

    send(
        &mut alice_ws,
        json!({ "event": "call-user", "data": { "receiverId": bob.id(), "offer": { "sdp": "o" } } }),
    )
    .await;
    let failed = expect_event(&mut alice_ws, "call-failed").await;
    assert_eq!(failed["reason"], "receiver-offline");
}

#[tokio::test]
async fn test_call_signaling_round_trip() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("Alice").await;
    let bob = app.create_user("Bob").await;
    let addr = app.spawn_server().await;

    let mut alice_ws = connect(addr, &alice.token).await;
    let mut bob_ws = connect(addr, &bob.token).await;
    expect_online(&mut alice_ws, &[&alice, &bob]).await;
    expect_online(&mut bob_ws, &[&alice, &bob]).await;

    let offer = json!({ "type": "offer", "sdp": "v=0 offer" });
    send(
        &mut alice_ws,
        json!({ "event": "call-user", "data": { "receiverId": bob.id(), "offer": offer } }),
    )
    .await;
    let incoming = expect_event(&mut bob_ws, "incoming-call").await;
    assert_eq!(incoming["callerId"], alice.id().to_string());
    assert_eq!(incoming["callerName"], "Alice");
    assert_eq!(incoming["offer"], offer);

    let answer = json!({ "type": "answer", "sdp": "v=0 answer" });
    send(
        &mut bob_ws,
        json!({ "event": "answer-call", "data": { "callerId": alice.id(), "answer": answer } }),
    )
    .await;
    let accepted = expect_event(&mut alice_ws, "call-accepted").await;
    assert_eq!(accepted["answer"], answer);

    let candidate = json!({ "candidate": "candidate:1 1 udp 1 10.0.0.1 5000 typ host" });
    send(
        &mut bob_ws,
        json!({ "event": "ice-candidate", "data": { "receiverId": alice.id(), "candidate": candidate } }),
    )
    .await;
    let relayed = expect_event(&mut alice_ws, "ice-candidate").await;
    assert_eq!(relayed["candidate"], candidate);

    send(
        &mut alice_ws,
        json!({ "event": "end-call", "data": { "receiverId": bob.id() } }),
    )
    .await;
    expect_event(&mut bob_ws, "call-ended").await;
}

#[tokio::test]
async fn test_malformed_frame_gets_error_then_close() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("Alice").await;
    let addr = app.spawn_server().await;

    let mut ws = connect(addr, &alice.token).await;
    expect_online(&mut ws, &[&alice]).await;

    ws.send(Message::Text("{not json".into())).await.expect("send");
    let error = expect_event(&mut ws, "error").await;
    assert_eq!(error["code"], "INVALID_MESSAGE");

    while next_event(&mut ws).await.is_some() {}
}
