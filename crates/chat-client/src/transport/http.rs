//! `reqwest` implementation of [`ChatApi`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use chat_core::types::id::UserId;
use chat_entity::call_log::CallLog;
use chat_entity::conversation::ChatPartner;
use chat_entity::message::Message;
use chat_entity::user::User;
use chat_service::call_log::{CallLogView, RecordCallLogRequest};
use chat_service::message::{MarkReadResult, SendMessageRequest};

use super::api::ChatApi;
use crate::error::ClientError;

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}

/// Talks to the chat server over HTTP with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpChatApi {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpChatApi {
    /// Client for `base_url` (no trailing slash) authenticating as `token`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        if status.is_success() {
            let envelope: Envelope<T> = response.json().await?;
            return Ok(envelope.data);
        }

        let bytes = response.bytes().await?;
        let body: Option<ErrorBody> = serde_json::from_slice(&bytes).ok();
        debug!(status = %status, "Request failed");
        Err(match body {
            Some(body) => ClientError::Api {
                status: status.as_u16(),
                code: body.error,
                message: body.message,
            },
            None => ClientError::Api {
                status: status.as_u16(),
                code: "UNKNOWN".to_string(),
                message: String::from_utf8_lossy(&bytes).into_owned(),
            },
        })
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn contacts(&self) -> Result<Vec<User>, ClientError> {
        self.execute(self.client.get(self.url("/messages/contacts")))
            .await
    }

    async fn chats(&self) -> Result<Vec<ChatPartner>, ClientError> {
        self.execute(self.client.get(self.url("/messages/chats"))).await
    }

    async fn conversation(&self, partner: UserId) -> Result<Vec<Message>, ClientError> {
        self.execute(self.client.get(self.url(&format!("/messages/{partner}"))))
            .await
    }

    async fn send(
        &self,
        receiver: UserId,
        request: &SendMessageRequest,
    ) -> Result<Message, ClientError> {
        let url = self.url(&format!("/messages/send/{receiver}"));
        self.execute(self.client.post(url).json(request)).await
    }

    async fn mark_as_read(&self, partner: UserId) -> Result<MarkReadResult, ClientError> {
        let url = self.url(&format!("/messages/mark-as-read/{partner}"));
        self.execute(self.client.post(url)).await
    }

    async fn record_call(&self, request: &RecordCallLogRequest) -> Result<CallLog, ClientError> {
        self.execute(self.client.post(self.url("/call-logs")).json(request))
            .await
    }

    async fn call_logs(&self) -> Result<Vec<CallLogView>, ClientError> {
        self.execute(self.client.get(self.url("/call-logs"))).await
    }
}
