//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use chat_core::types::id::UserId;

/// A registered user as seen by the chat core.
///
/// Accounts are created elsewhere; this crate only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Name shown in chat lists and on incoming calls.
    pub full_name: String,
    /// Email address (optional).
    pub email: Option<String>,
    /// Avatar URL.
    pub profile_pic: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a user record with no email or avatar.
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            full_name: full_name.into(),
            email: None,
            profile_pic: None,
            created_at: Utc::now(),
        }
    }

    /// Attach an email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Name to display, falling back to the email local part.
    pub fn display_name(&self) -> &str {
        if !self.full_name.trim().is_empty() {
            return &self.full_name;
        }
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .unwrap_or("Unknown")
    }
}
