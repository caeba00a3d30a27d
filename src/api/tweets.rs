//! Tweet endpoints
//!
//! Short text posts on a user's channel feed.

use axum::extract::{Path, State};
use chrono::Utc;
use serde::Deserialize;

use crate::AppState;
use crate::auth::{CurrentUser, assert_owner};
use crate::data::{EntityId, Tweet};
use crate::error::AppError;

use super::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct TweetRequest {
    pub content: String,
}

/// Post a new tweet
pub async fn create_tweet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    axum::Json(req): axum::Json<TweetRequest>,
) -> Result<ApiResponse<Tweet>, AppError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("tweet content is required".to_string()));
    }

    let now = Utc::now();
    let tweet = Tweet {
        id: EntityId::new(),
        owner_id: user.id,
        content: content.to_string(),
        created_at: now,
        updated_at: now,
    };
    state.db.insert_tweet(&tweet).await?;

    Ok(ApiResponse::created(tweet, "tweet posted successfully"))
}

/// List a user's tweets, newest first
pub async fn user_tweets(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(user_id): Path<EntityId>,
) -> Result<ApiResponse<Vec<Tweet>>, AppError> {
    state
        .db
        .get_public_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user does not exist".to_string()))?;

    let tweets = state.db.user_tweets(&user_id).await?;

    Ok(ApiResponse::ok(tweets, "tweets fetched"))
}

/// Edit a tweet's content (owner only)
pub async fn update_tweet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tweet_id): Path<EntityId>,
    axum::Json(req): axum::Json<TweetRequest>,
) -> Result<ApiResponse<Tweet>, AppError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("tweet content is required".to_string()));
    }

    let tweet = state
        .db
        .get_tweet(&tweet_id)
        .await?
        .ok_or_else(|| AppError::NotFound("tweet does not exist".to_string()))?;
    assert_owner(&tweet.owner_id, &user, "tweet")?;

    state.db.update_tweet(&tweet_id, content).await?;

    let updated = state
        .db
        .get_tweet(&tweet_id)
        .await?
        .ok_or_else(|| AppError::NotFound("tweet does not exist".to_string()))?;

    Ok(ApiResponse::ok(updated, "tweet updated successfully"))
}

/// Delete a tweet (owner only)
pub async fn delete_tweet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tweet_id): Path<EntityId>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let tweet = state
        .db
        .get_tweet(&tweet_id)
        .await?
        .ok_or_else(|| AppError::NotFound("tweet does not exist".to_string()))?;
    assert_owner(&tweet.owner_id, &user, "tweet")?;

    state.db.delete_tweet(&tweet_id).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "tweet deleted successfully",
    ))
}
