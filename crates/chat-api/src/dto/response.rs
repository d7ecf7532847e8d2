//! Success envelope shared by every JSON route.

use serde::{Deserialize, Serialize};

/// `{"success": true, "data": ...}`. Errors use
/// [`ApiErrorResponse`](crate::error::ApiErrorResponse) instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
