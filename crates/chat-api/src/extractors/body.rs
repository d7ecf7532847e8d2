//! JSON body extraction with API-shaped rejections.

use axum::extract::{FromRequest, Request};
use bytes::Bytes;
use serde::de::DeserializeOwned;

use chat_core::error::AppError;

use crate::error::ApiError;

/// Like `axum::Json`, but malformed bodies become a 400 `VALIDATION_ERROR`
/// with the standard error body.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(format!("Unreadable request body: {e}")))?;
        parse_json(&bytes).map(JsonBody)
    }
}

/// Parse a JSON body; an empty body yields `T::default()`.
pub fn parse_optional_json<T>(bytes: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    parse_json(bytes)
}

fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(bytes)
        .map_err(|e| AppError::validation(format!("Invalid JSON body: {e}")).into())
}
