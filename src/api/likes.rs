//! Like endpoints
//!
//! Toggle semantics throughout: each call flips the state and reports
//! where it landed. The target entity must exist before any toggle.

use axum::extract::{Path, State};
use serde::Serialize;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{EntityId, LikeTarget, VideoWithOwner};
use crate::error::AppError;

use super::response::ApiResponse;

#[derive(Debug, Serialize)]
pub struct LikeStatePayload {
    pub liked: bool,
}

/// Toggle a like on a video
pub async fn toggle_video_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<EntityId>,
) -> Result<ApiResponse<LikeStatePayload>, AppError> {
    state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;

    let liked = state
        .db
        .toggle_like(&user.id, LikeTarget::Video, &video_id)
        .await?;

    Ok(ApiResponse::ok(LikeStatePayload { liked }, "like toggled"))
}

/// Toggle a like on a comment
pub async fn toggle_comment_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<EntityId>,
) -> Result<ApiResponse<LikeStatePayload>, AppError> {
    state
        .db
        .get_comment(&comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("comment does not exist".to_string()))?;

    let liked = state
        .db
        .toggle_like(&user.id, LikeTarget::Comment, &comment_id)
        .await?;

    Ok(ApiResponse::ok(LikeStatePayload { liked }, "like toggled"))
}

/// Toggle a like on a tweet
pub async fn toggle_tweet_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tweet_id): Path<EntityId>,
) -> Result<ApiResponse<LikeStatePayload>, AppError> {
    state
        .db
        .get_tweet(&tweet_id)
        .await?
        .ok_or_else(|| AppError::NotFound("tweet does not exist".to_string()))?;

    let liked = state
        .db
        .toggle_like(&user.id, LikeTarget::Tweet, &tweet_id)
        .await?;

    Ok(ApiResponse::ok(LikeStatePayload { liked }, "like toggled"))
}

/// The viewer's liked videos, most recently liked first
///
/// Only published videos appear; likes on since-hidden videos are kept
/// but not shown.
pub async fn liked_videos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<Vec<VideoWithOwner>>, AppError> {
    let videos = state.db.liked_videos(&user.id).await?;
    Ok(ApiResponse::ok(videos, "liked videos fetched"))
}
