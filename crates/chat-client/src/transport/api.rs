//! The HTTP surface the client state is driven by.

use async_trait::async_trait;

use chat_core::types::id::UserId;
use chat_entity::call_log::CallLog;
use chat_entity::conversation::ChatPartner;
use chat_entity::message::Message;
use chat_entity::user::User;
use chat_service::call_log::{CallLogView, RecordCallLogRequest};
use chat_service::message::{MarkReadResult, SendMessageRequest};

use crate::error::ClientError;

/// Message and call-log endpoints. Implemented over HTTP by
/// [`super::HttpChatApi`]; tests substitute an in-process fake.
#[async_trait]
pub trait ChatApi: Send + Sync + 'static {
    /// `GET /api/messages/contacts`
    async fn contacts(&self) -> Result<Vec<User>, ClientError>;

    /// `GET /api/messages/chats`
    async fn chats(&self) -> Result<Vec<ChatPartner>, ClientError>;

    /// `GET /api/messages/{partner}`
    async fn conversation(&self, partner: UserId) -> Result<Vec<Message>, ClientError>;

    /// `POST /api/messages/send/{receiver}`
    async fn send(
        &self,
        receiver: UserId,
        request: &SendMessageRequest,
    ) -> Result<Message, ClientError>;

    /// `POST /api/messages/mark-as-read/{partner}`
    async fn mark_as_read(&self, partner: UserId) -> Result<MarkReadResult, ClientError>;

    /// `POST /api/call-logs`
    async fn record_call(&self, request: &RecordCallLogRequest) -> Result<CallLog, ClientError>;

    /// `GET /api/call-logs`
    async fn call_logs(&self) -> Result<Vec<CallLogView>, ClientError>;
}
