//! Recording and listing call logs.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use chat_core::error::AppError;
use chat_core::types::id::UserId;
use chat_database::store::{CallLogStore, UserStore};
use chat_entity::call_log::{CallLog, CallLogEntry, CallOutcome, NewCallLog};
use chat_entity::user::User;

use crate::context::RequestContext;

/// Body of `POST /api/call-logs`. The caller is always the requester.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCallLogRequest {
    /// Who was called.
    pub receiver_id: UserId,
    /// Connected time in seconds.
    #[serde(default, alias = "duration")]
    pub duration_seconds: i64,
    /// How the call ended.
    #[serde(alias = "status")]
    pub outcome: CallOutcome,
}

/// A call log as one participant sees it, with the other party's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLogView {
    /// The log and its direction.
    #[serde(flatten)]
    pub entry: CallLogEntry,
    /// The other participant; `None` if their record is gone.
    pub contact: Option<User>,
}

/// Records finished calls and lists a user's call history.
#[derive(Clone)]
pub struct CallLogService {
    /// User store.
    users: Arc<dyn UserStore>,
    /// Call log store.
    call_logs: Arc<dyn CallLogStore>,
}

impl std::fmt::Debug for CallLogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallLogService").finish()
    }
}

impl CallLogService {
    /// Creates a new call log service.
    pub fn new(users: Arc<dyn UserStore>, call_logs: Arc<dyn CallLogStore>) -> Self {
        Self { users, call_logs }
    }

    /// Record a call placed by the requester.
    pub async fn record(
        &self,
        ctx: &RequestContext,
        req: RecordCallLogRequest,
    ) -> Result<CallLog, AppError> {
        if ctx.is_self(req.receiver_id) {
            return Err(AppError::validation("Cannot call yourself"));
        }
        if req.duration_seconds < 0 {
            return Err(AppError::validation("Duration cannot be negative"));
        }
        if self.users.find_by_id(req.receiver_id).await?.is_none() {
            return Err(AppError::not_found("Receiver not found"));
        }

        let log = self
            .call_logs
            .insert(NewCallLog {
                caller_id: ctx.user_id,
                receiver_id: req.receiver_id,
                duration_seconds: req.duration_seconds,
                outcome: req.outcome,
            })
            .await?;

        info!(
            call_log_id = %log.id,
            caller_id = %log.caller_id,
            receiver_id = %log.receiver_id,
            outcome = %log.outcome,
            duration = log.duration_seconds,
            "Call log recorded"
        );
        Ok(log)
    }

    /// Calls the requester placed or received, newest first.
    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<CallLogView>, AppError> {
        let logs = self.call_logs.for_user(ctx.user_id).await?;

        let mut contacts: HashMap<UserId, Option<User>> = HashMap::new();
        let mut views = Vec::with_capacity(logs.len());
        for log in logs {
            let Some(entry) = CallLogEntry::for_viewer(log, ctx.user_id) else {
                continue;
            };
            let other = if entry.log.caller_id == ctx.user_id {
                entry.log.receiver_id
            } else {
                entry.log.caller_id
            };
            let contact = match contacts.get(&other) {
                Some(cached) => cached.clone(),
                None => {
                    let user = self.users.find_by_id(other).await?;
                    contacts.insert(other, user.clone());
                    user
                }
            };
            views.push(CallLogView { entry, contact });
        }

        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::error::ErrorKind;
    use chat_database::MemoryStore;
    use chat_entity::call_log::CallDirection;

    async fn setup() -> (CallLogService, User, User) {
        let store = MemoryStore::new();
        let alice = User::new("Alice");
        let bob = User::new("Bob");
        store.create(&alice).await.unwrap();
        store.create(&bob).await.unwrap();
        let service = CallLogService::new(Arc::new(store.clone()), Arc::new(store));
        (service, alice, bob)
    }

    #[tokio::test]
    async fn test_record_and_list_per_viewer() {
        let (service, alice, bob) = setup().await;
        let log = service
            .record(
                &RequestContext::new(alice.id, "Alice"),
                RecordCallLogRequest {
                    receiver_id: bob.id,
                    duration_seconds: 65,
                    outcome: CallOutcome::Completed,
                },
            )
            .await
            .unwrap();
        assert_eq!(log.caller_id, alice.id);
        assert_eq!(log.duration_seconds, 65);

        let mine = service
            .list(&RequestContext::new(alice.id, "Alice"))
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].entry.direction, CallDirection::Outgoing);
        assert_eq!(mine[0].contact.as_ref().map(|u| u.id), Some(bob.id));

        let theirs = service
            .list(&RequestContext::new(bob.id, "Bob"))
            .await
            .unwrap();
        assert_eq!(theirs[0].entry.direction, CallDirection::Incoming);
        assert_eq!(theirs[0].contact.as_ref().map(|u| u.id), Some(alice.id));
    }

    #[tokio::test]
    async fn test_declined_call_has_no_duration() {
        let (service, alice, bob) = setup().await;
        let log = service
            .record(
                &RequestContext::new(alice.id, "Alice"),
                RecordCallLogRequest {
                    receiver_id: bob.id,
                    duration_seconds: 12,
                    outcome: CallOutcome::Declined,
                },
            )
            .await
            .unwrap();
        assert_eq!(log.duration_seconds, 0);
    }

    #[tokio::test]
    async fn test_record_rejects_bad_input() {
        let (service, alice, _) = setup().await;
        let ctx = RequestContext::new(alice.id, "Alice");

        let err = service
            .record(
                &ctx,
                RecordCallLogRequest {
                    receiver_id: UserId::new(),
                    duration_seconds: 0,
                    outcome: CallOutcome::Missed,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let err = service
            .record(
                &ctx,
                RecordCallLogRequest {
                    receiver_id: alice.id,
                    duration_seconds: 0,
                    outcome: CallOutcome::Missed,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_request_accepts_legacy_field_names() {
        let req: RecordCallLogRequest = serde_json::from_value(serde_json::json!({
            "receiverId": UserId::new(),
            "duration": 30,
            "status": "completed"
        }))
        .unwrap();
        assert_eq!(req.duration_seconds, 30);
        assert_eq!(req.outcome, CallOutcome::Completed);
    }
}
