//! Subscription endpoints

use axum::extract::{Path, State};
use serde::Serialize;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{EntityId, SubscriptionEntry};
use crate::error::AppError;

use super::response::ApiResponse;

#[derive(Debug, Serialize)]
pub struct SubscriptionStatePayload {
    pub subscribed: bool,
}

/// Toggle the viewer's subscription to a channel
///
/// Subscribing to your own channel is rejected.
pub async fn toggle_subscription(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(channel_id): Path<EntityId>,
) -> Result<ApiResponse<SubscriptionStatePayload>, AppError> {
    state
        .db
        .get_public_user(&channel_id)
        .await?
        .ok_or_else(|| AppError::NotFound("channel does not exist".to_string()))?;

    if channel_id == user.id {
        return Err(AppError::BadRequest(
            "you cannot subscribe to your own channel".to_string(),
        ));
    }

    let subscribed = state.db.toggle_subscription(&user.id, &channel_id).await?;

    Ok(ApiResponse::ok(
        SubscriptionStatePayload { subscribed },
        "subscription toggled",
    ))
}

/// List a channel's subscribers
pub async fn channel_subscribers(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(channel_id): Path<EntityId>,
) -> Result<ApiResponse<Vec<SubscriptionEntry>>, AppError> {
    state
        .db
        .get_public_user(&channel_id)
        .await?
        .ok_or_else(|| AppError::NotFound("channel does not exist".to_string()))?;

    let subscribers = state.db.channel_subscribers(&channel_id).await?;

    Ok(ApiResponse::ok(subscribers, "subscribers fetched"))
}

/// List the channels a user is subscribed to
pub async fn subscribed_channels(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(subscriber_id): Path<EntityId>,
) -> Result<ApiResponse<Vec<SubscriptionEntry>>, AppError> {
    state
        .db
        .get_public_user(&subscriber_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user does not exist".to_string()))?;

    let channels = state.db.subscribed_channels(&subscriber_id).await?;

    Ok(ApiResponse::ok(channels, "subscribed channels fetched"))
}
