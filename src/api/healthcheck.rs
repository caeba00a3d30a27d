//! Healthcheck endpoint

use crate::error::AppError;

use super::response::ApiResponse;

/// Liveness probe, wrapped in the standard envelope
pub async fn healthcheck() -> Result<ApiResponse<serde_json::Value>, AppError> {
    Ok(ApiResponse::ok(
        serde_json::json!({ "status": "ok" }),
        "service is healthy",
    ))
}
