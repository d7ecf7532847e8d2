//! Call log handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use chat_entity::call_log::CallLog;
use chat_service::call_log::{CallLogView, RecordCallLogRequest};

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{AuthUser, JsonBody};
use crate::state::AppState;

/// GET /api/call-logs
pub async fn list_call_logs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<CallLogView>>>, ApiError> {
    let logs = state.call_log_service.list(&auth).await?;
    Ok(Json(ApiResponse::ok(logs)))
}

/// POST /api/call-logs
pub async fn record_call_log(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(req): JsonBody<RecordCallLogRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CallLog>>), ApiError> {
    let log = state.call_log_service.record(&auth, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(log))))
}
