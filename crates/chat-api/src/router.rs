//! Route definitions for the chat relay HTTP API.
//!
//! All REST routes are organized by domain and mounted under `/api`; the
//! relay upgrade lives at `/ws`. The router receives `AppState` and passes
//! it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with all routes and the request-logging layer.
///
/// Receives the fully-constructed `AppState` and threads it through
/// every route via `.with_state(state)`.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;

    let api_routes = Router::new()
        .merge(message_routes())
        .merge(call_log_routes())
        .merge(health_routes());

    let ws_routes = Router::new().route("/ws", get(handlers::ws::ws_upgrade));

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Contacts, conversations, sending, read receipts
fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/messages/contacts", get(handlers::message::list_contacts))
        .route("/messages/chats", get(handlers::message::list_chat_partners))
        .route(
            "/messages/send/{user_id}",
            post(handlers::message::send_message),
        )
        .route(
            "/messages/mark-as-read/{user_id}",
            post(handlers::message::mark_as_read),
        )
        .route(
            "/messages/{user_id}",
            get(handlers::message::get_conversation),
        )
}

/// Call history
fn call_log_routes() -> Router<AppState> {
    Router::new().route(
        "/call-logs",
        get(handlers::call_log::list_call_logs).post(handlers::call_log::record_call_log),
    )
}

/// Liveness
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}
