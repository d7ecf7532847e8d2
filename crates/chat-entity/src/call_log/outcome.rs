//! How a call ended, and which way it went for a given participant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use chat_core::AppError;

/// Stored as the Postgres enum `call_outcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "call_outcome", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CallOutcome {
    /// Media connected on both ends.
    Completed,
    /// Never answered: timed out, cancelled by the caller, or callee offline.
    Missed,
    Declined,
}

impl CallOutcome {
    pub const ALL: [Self; 3] = [Self::Completed, Self::Missed, Self::Declined];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Missed => "missed",
            Self::Declined => "declined",
        }
    }

    /// Only completed calls carry talk time; other outcomes store zero.
    pub fn keeps_duration(self) -> bool {
        self == Self::Completed
    }
}

impl fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallOutcome {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, AppError> {
        Self::ALL
            .into_iter()
            .find(|o| o.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                AppError::validation(format!(
                    "Unknown call outcome '{s}' (expected completed, missed or declined)"
                ))
            })
    }
}

/// Orientation of a logged call relative to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    /// The viewer dialed.
    Outgoing,
    Incoming,
}

impl fmt::Display for CallDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Outgoing => "outgoing",
            Self::Incoming => "incoming",
        })
    }
}
