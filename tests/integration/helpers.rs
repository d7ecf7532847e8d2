//! Shared test helpers for integration tests.

use std::net::SocketAddr;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use chat_api::state::AppState;
use chat_auth::jwt::JwtEncoder;
use chat_core::config::AppConfig;
use chat_core::config::database::StoreProvider;
use chat_core::types::id::UserId;
use chat_database::{MemoryStore, Stores, UserStore};
use chat_entity::user::User;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared application state
    pub state: AppState,
    /// Backing store for direct inspection
    pub store: MemoryStore,
}

/// A seeded user and a valid token for them.
#[derive(Debug, Clone)]
pub struct TestUser {
    /// The stored profile
    pub user: User,
    /// Signed session token
    pub token: String,
}

impl TestUser {
    /// The user's id
    pub fn id(&self) -> UserId {
        self.user.id
    }
}

impl TestApp {
    /// Create a new test application backed by an in-memory store
    pub async fn new() -> Self {
        let mut config = AppConfig::default();
        config.database.provider = StoreProvider::Memory;
        config.auth.jwt_secret = "integration-test-secret".to_string();
        Self::with_config(config)
    }

    /// Create a test application with a custom configuration
    pub fn with_config(config: AppConfig) -> Self {
        let store = MemoryStore::new();
        let state = AppState::build(config, Stores::memory(store.clone()));
        let router = chat_api::build_app(state.clone());
        Self {
            router,
            state,
            store,
        }
    }

    /// Insert a user and issue a token for them
    pub async fn create_user(&self, full_name: &str) -> TestUser {
        let email = format!("{}@test.com", full_name.to_lowercase().replace(' ', "."));
        let user = User::new(full_name).with_email(email);
        self.store
            .create(&user)
            .await
            .expect("Failed to create test user");
        let (token, _) = self
            .state
            .jwt_encoder
            .issue(user.id)
            .expect("Failed to issue token");
        TestUser { user, token }
    }

    /// A token for a user that does not exist in the store
    pub fn token_for_unknown_user(&self) -> String {
        JwtEncoder::new(&self.state.config.auth)
            .issue(UserId::new())
            .expect("Failed to issue token")
            .0
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Serve the app on an ephemeral port for WebSocket tests
    pub async fn spawn_server(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("No local address");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Test server failed");
        });
        addr
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `data` field of a success envelope
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}
