//! Message handlers mounted under `/api/messages`.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use bytes::Bytes;

use chat_entity::conversation::ChatPartner;
use chat_entity::message::Message;
use chat_entity::user::User;
use chat_service::message::{MarkReadRequest, MarkReadResult, SendMessageRequest};

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::body::parse_optional_json;
use crate::extractors::path::parse_user_id;
use crate::extractors::{AuthUser, JsonBody};
use crate::state::AppState;

/// GET /api/messages/contacts
pub async fn list_contacts(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let contacts = state.contact_service.list_contacts(&auth).await?;
    Ok(Json(ApiResponse::ok(contacts)))
}

/// GET /api/messages/chats
pub async fn list_chat_partners(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<ChatPartner>>>, ApiError> {
    let partners = state.message_service.chat_partners(&auth).await?;
    Ok(Json(ApiResponse::ok(partners)))
}

/// GET /api/messages/{user_id}
pub async fn get_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Message>>>, ApiError> {
    let peer_id = parse_user_id(&user_id)?;
    let messages = state.message_service.history(&auth, peer_id).await?;
    Ok(Json(ApiResponse::ok(messages)))
}

/// POST /api/messages/send/{user_id}
pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
    JsonBody(req): JsonBody<SendMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Message>>), ApiError> {
    let receiver_id = parse_user_id(&user_id)?;
    let message = state.message_service.send(&auth, receiver_id, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message))))
}

/// POST /api/messages/mark-as-read/{user_id}
///
/// The body is optional; when present it may carry `readerId`.
pub async fn mark_as_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<Json<ApiResponse<MarkReadResult>>, ApiError> {
    let peer_id = parse_user_id(&user_id)?;
    let req: MarkReadRequest = parse_optional_json(&body)?;
    let result = state
        .message_service
        .mark_as_read(&auth, peer_id, req)
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}
