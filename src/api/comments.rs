//! Comment endpoints

use axum::extract::{Path, Query, State};
use chrono::Utc;
use serde::Deserialize;

use crate::AppState;
use crate::auth::{CurrentUser, assert_owner};
use crate::data::{Comment, CommentWithOwner, EntityId};
use crate::error::AppError;

use super::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct CommentPageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

/// List a video's comments, newest first
pub async fn video_comments(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(video_id): Path<EntityId>,
    Query(params): Query<CommentPageParams>,
) -> Result<ApiResponse<Vec<CommentWithOwner>>, AppError> {
    state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;

    let comments = state
        .db
        .comments_for_video(&video_id, params.page.unwrap_or(1), params.limit.unwrap_or(10))
        .await?;

    Ok(ApiResponse::ok(comments, "comments fetched"))
}

/// Add a comment to a video
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<EntityId>,
    axum::Json(req): axum::Json<CommentRequest>,
) -> Result<ApiResponse<Comment>, AppError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("comment content is required".to_string()));
    }

    state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;

    let now = Utc::now();
    let comment = Comment {
        id: EntityId::new(),
        video_id,
        owner_id: user.id,
        content: content.to_string(),
        created_at: now,
        updated_at: now,
    };
    state.db.insert_comment(&comment).await?;

    Ok(ApiResponse::created(comment, "comment added successfully"))
}

/// Edit a comment's content (owner only)
pub async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<EntityId>,
    axum::Json(req): axum::Json<CommentRequest>,
) -> Result<ApiResponse<Comment>, AppError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("comment content is required".to_string()));
    }

    let comment = state
        .db
        .get_comment(&comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("comment does not exist".to_string()))?;
    assert_owner(&comment.owner_id, &user, "comment")?;

    state.db.update_comment(&comment_id, content).await?;

    let updated = state
        .db
        .get_comment(&comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("comment does not exist".to_string()))?;

    Ok(ApiResponse::ok(updated, "comment updated successfully"))
}

/// Delete a comment (owner only)
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<EntityId>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let comment = state
        .db
        .get_comment(&comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("comment does not exist".to_string()))?;
    assert_owner(&comment.owner_id, &user, "comment")?;

    state.db.delete_comment(&comment_id).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "comment deleted successfully",
    ))
}
