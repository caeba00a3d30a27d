//! Channel dashboard endpoints
//!
//! Owner-facing aggregates over the authenticated user's own channel.

use axum::extract::State;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{DashboardStats, Video};
use crate::error::AppError;

use super::response::ApiResponse;

/// Channel totals: videos, views, subscribers, likes
///
/// Every count is zero for a fresh channel rather than absent.
pub async fn stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<DashboardStats>, AppError> {
    let stats = state.db.dashboard_stats(&user.id).await?;
    Ok(ApiResponse::ok(stats, "channel stats fetched"))
}

/// All of the channel's videos, published or not, newest first
pub async fn channel_videos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<Vec<Video>>, AppError> {
    let videos = state.db.channel_videos(&user.id).await?;
    Ok(ApiResponse::ok(videos, "channel videos fetched"))
}
