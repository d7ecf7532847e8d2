//! Authenticated caller for the REST routes.

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, HeaderName};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;

use chat_auth::credential::CredentialSources;
use chat_service::context::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Verified caller. Dereferences to the [`RequestContext`] services take.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;

    fn deref(&self) -> &RequestContext {
        &self.0
    }
}

/// Cookie and bearer header of a request, plus the `?token=` value when the
/// route accepts one (only `/ws` does).
pub fn credential_sources<'a>(
    headers: &'a HeaderMap,
    query_token: Option<&'a str>,
) -> CredentialSources<'a> {
    CredentialSources {
        cookie_header: header_str(headers, COOKIE),
        authorization: header_str(headers, AUTHORIZATION),
        query_token,
    }
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = credential_sources(&parts.headers, None).resolve(&state.config.auth.cookie_name);
        let identity = state.verifier.verify(token).await?;

        Ok(Self(RequestContext::new(
            identity.user_id(),
            identity.display_name(),
        )))
    }
}
