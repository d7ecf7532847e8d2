//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use chat_auth::jwt::{JwtDecoder, JwtEncoder};
use chat_auth::verifier::IdentityVerifier;
use chat_core::config::AppConfig;
use chat_database::Stores;
use chat_realtime::connection::authenticator::WsAuthenticator;
use chat_realtime::server::RealtimeEngine;
use chat_service::{CallLogService, ContactService, MessageService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Process start, for uptime reporting
    pub started_at: Instant,

    // ── Infrastructure ───────────────────────────────────────
    /// Message store gateway
    pub stores: Stores,

    // ── Auth ─────────────────────────────────────────────────
    /// JWT token encoder
    pub jwt_encoder: Arc<JwtEncoder>,
    /// Shared identity verifier (HTTP and handshake)
    pub verifier: Arc<IdentityVerifier>,
    /// Handshake authenticator
    pub ws_authenticator: Arc<WsAuthenticator>,

    // ── Realtime ─────────────────────────────────────────────
    /// WebSocket relay engine
    pub realtime: Arc<RealtimeEngine>,

    // ── Services ─────────────────────────────────────────────
    /// Contact listing
    pub contact_service: Arc<ContactService>,
    /// Messages and read receipts
    pub message_service: Arc<MessageService>,
    /// Call history
    pub call_log_service: Arc<CallLogService>,
}

impl AppState {
    /// Wire every component on top of an opened store gateway.
    pub fn build(config: AppConfig, stores: Stores) -> Self {
        // ── Auth ─────────────────────────────────────────────
        let jwt_encoder = Arc::new(JwtEncoder::new(&config.auth));
        let verifier = IdentityVerifier::new(JwtDecoder::new(&config.auth), stores.users.clone());
        let ws_authenticator = Arc::new(WsAuthenticator::new(
            verifier.clone(),
            config.auth.cookie_name.clone(),
        ));

        // ── Realtime ─────────────────────────────────────────
        let realtime = Arc::new(RealtimeEngine::new(config.realtime.clone()));

        // ── Services ─────────────────────────────────────────
        let contact_service = Arc::new(ContactService::new(stores.users.clone()));
        let message_service = Arc::new(MessageService::new(
            stores.users.clone(),
            stores.messages.clone(),
            realtime.relay.clone(),
        ));
        let call_log_service = Arc::new(CallLogService::new(
            stores.users.clone(),
            stores.call_logs.clone(),
        ));

        info!("Application state initialized");

        Self {
            config: Arc::new(config),
            started_at: Instant::now(),
            stores,
            jwt_encoder,
            verifier: Arc::new(verifier),
            ws_authenticator,
            realtime,
            contact_service,
            message_service,
            call_log_service,
        }
    }
}
