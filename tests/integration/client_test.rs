//! End-to-end tests driving the chat client against a live server.

mod helpers;

use std::future::Future;
use std::time::Duration;

use chat_client::{ChatClient, ClientConfig, ClientNotice};

fn client_config(addr: std::net::SocketAddr) -> ClientConfig {
    let mut config = ClientConfig::new(format!("http://{addr}"));
    config.read_ack_debounce = Duration::from_millis(100);
    config
}

/// Poll `check` until it returns true or five seconds pass.
async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_read_receipt_end_to_end() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("Alice").await;
    let bob = app.create_user("Bob").await;
    let addr = app.spawn_server().await;

    let (alice_client, _alice_notices) =
        ChatClient::connect(client_config(addr), &alice.token, alice.id())
            .await
            .expect("alice connects");
    let (bob_client, _bob_notices) = ChatClient::connect(client_config(addr), &bob.token, bob.id())
        .await
        .expect("bob connects");

    let (alice_id, bob_id) = (alice.id(), bob.id());
    assert!(
        eventually(|| alice_client.view(move |s| s.is_online(bob_id))).await,
        "alice never saw bob online"
    );

    bob_client.open(alice.id()).await.expect("bob opens");
    alice_client.open(bob.id()).await.expect("alice opens");
    alice_client
        .send(Some("hello bob".into()), None)
        .await
        .expect("send");

    // Bob's open conversation receives the push and acknowledges it.
    assert!(
        eventually(|| bob_client.view(move |s| s.messages(alice_id).len() == 1)).await,
        "bob never received the message"
    );
    assert!(
        eventually(|| alice_client.view(move |s| {
            let messages = s.messages(bob_id);
            messages.len() == 1 && messages[0].is_read() && messages[0].text() == Some("hello bob")
        }))
        .await,
        "alice never saw the read receipt"
    );
    assert_eq!(
        bob_client.view(|s| s.chat(alice.id()).map(|e| e.unread_count)).await,
        Some(0)
    );
    assert_eq!(alice_client.view(|s| s.messages(bob.id()).len()).await, 1);
}

#[tokio::test]
async fn test_rejected_send_is_rolled_back() {
    let app = helpers::TestApp::new().await;
    let alice = app.create_user("Alice").await;
    let addr = app.spawn_server().await;

    let (client, mut notices) = ChatClient::connect(client_config(addr), &alice.token, alice.id())
        .await
        .expect("connect");

    // The server refuses messages to oneself.
    client.open(alice.id()).await.expect("open");
    let err = client
        .send(Some("note to self".into()), None)
        .await
        .expect_err("self-send must fail");
    assert_eq!(err.status(), Some(400));

    assert!(client.view(|s| s.messages(alice.id()).is_empty()).await);
    assert_eq!(client.view(|s| s.pending_count()).await, 0);
    assert!(matches!(
        notices.recv().await,
        Some(ClientNotice::SendFailed { .. })
    ));
}
