//! `[auth]` section.

use serde::{Deserialize, Serialize};

use super::PLACEHOLDER_SECRET;

/// Settings for verifying (and, in tests and tooling, issuing) HS256 tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
    /// Cookie the browser client stores the token in.
    pub cookie_name: String,
    /// Clock skew tolerated on `exp`.
    pub leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: PLACEHOLDER_SECRET.to_string(),
            token_ttl_hours: 24,
            cookie_name: "jwt".to_string(),
            leeway_seconds: 0,
        }
    }
}
