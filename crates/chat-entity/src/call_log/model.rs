//! Call log entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use chat_core::types::id::{CallLogId, UserId};

use super::outcome::{CallDirection, CallOutcome};

/// A finished call. Media never touches the server; only this summary is
/// stored, written by the caller's client when its session ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CallLog {
    /// Unique identifier.
    pub id: CallLogId,
    /// Who placed the call.
    pub caller_id: UserId,
    /// Who was called.
    pub receiver_id: UserId,
    /// Connected time in seconds (zero unless completed).
    pub duration_seconds: i64,
    /// How the call ended.
    pub outcome: CallOutcome,
    /// When the log was recorded.
    pub created_at: DateTime<Utc>,
}

impl CallLog {
    /// Direction from `viewer`'s side. `None` if the viewer took no part.
    pub fn direction_for(&self, viewer: UserId) -> Option<CallDirection> {
        if self.caller_id == viewer {
            Some(CallDirection::Outgoing)
        } else if self.receiver_id == viewer {
            Some(CallDirection::Incoming)
        } else {
            None
        }
    }
}

/// Data required to record a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCallLog {
    /// Who placed the call.
    pub caller_id: UserId,
    /// Who was called.
    pub receiver_id: UserId,
    /// Connected time in seconds.
    pub duration_seconds: i64,
    /// How the call ended.
    pub outcome: CallOutcome,
}

impl NewCallLog {
    /// Materialize the stored row.
    pub fn into_call_log(self, id: CallLogId, created_at: DateTime<Utc>) -> CallLog {
        let duration_seconds = if self.outcome.keeps_duration() {
            self.duration_seconds.max(0)
        } else {
            0
        };
        CallLog {
            id,
            caller_id: self.caller_id,
            receiver_id: self.receiver_id,
            duration_seconds,
            outcome: self.outcome,
            created_at,
        }
    }
}

/// A call log annotated for one viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLogEntry {
    /// The stored log.
    #[serde(flatten)]
    pub log: CallLog,
    /// Direction from the viewer's side.
    pub direction: CallDirection,
}

impl CallLogEntry {
    /// Annotate `log` for `viewer`; `None` if the viewer took no part.
    pub fn for_viewer(log: CallLog, viewer: UserId) -> Option<Self> {
        let direction = log.direction_for(viewer)?;
        Some(Self { log, direction })
    }
}
