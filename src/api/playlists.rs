//! Playlist endpoints
//!
//! Playlists are owner-scoped: names are unique per owner and only the
//! owner can mutate a playlist or its membership.

use axum::extract::{Path, State};
use chrono::Utc;
use serde::Deserialize;

use crate::AppState;
use crate::auth::{CurrentUser, assert_owner};
use crate::data::{EntityId, Playlist, PlaylistSummary, PlaylistView};
use crate::error::AppError;

use super::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Create a playlist
pub async fn create_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    axum::Json(req): axum::Json<CreatePlaylistRequest>,
) -> Result<ApiResponse<Playlist>, AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("playlist name is required".to_string()));
    }

    let now = Utc::now();
    let playlist = Playlist {
        id: EntityId::new(),
        owner_id: user.id,
        name: name.to_string(),
        description: req.description.unwrap_or_default().trim().to_string(),
        created_at: now,
        updated_at: now,
    };
    state.db.insert_playlist(&playlist).await?;

    Ok(ApiResponse::created(playlist, "playlist created successfully"))
}

/// Fetch a playlist with its owner and videos in order
pub async fn get_playlist(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(playlist_id): Path<EntityId>,
) -> Result<ApiResponse<PlaylistView>, AppError> {
    let view = state
        .db
        .playlist_view(&playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("playlist does not exist".to_string()))?;

    Ok(ApiResponse::ok(view, "playlist fetched"))
}

/// Patch a playlist's name and/or description (owner only)
pub async fn update_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(playlist_id): Path<EntityId>,
    axum::Json(req): axum::Json<UpdatePlaylistRequest>,
) -> Result<ApiResponse<PlaylistView>, AppError> {
    if req.name.is_none() && req.description.is_none() {
        return Err(AppError::BadRequest(
            "at least one of name or description is required".to_string(),
        ));
    }
    let name = req.name.as_deref().map(str::trim);
    if name == Some("") {
        return Err(AppError::BadRequest("playlist name cannot be empty".to_string()));
    }

    let playlist = state
        .db
        .get_playlist(&playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("playlist does not exist".to_string()))?;
    assert_owner(&playlist.owner_id, &user, "playlist")?;

    state
        .db
        .update_playlist(&playlist_id, name, req.description.as_deref().map(str::trim))
        .await?;

    let view = state
        .db
        .playlist_view(&playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("playlist does not exist".to_string()))?;

    Ok(ApiResponse::ok(view, "playlist updated successfully"))
}

/// Delete a playlist (owner only)
pub async fn delete_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(playlist_id): Path<EntityId>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let playlist = state
        .db
        .get_playlist(&playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("playlist does not exist".to_string()))?;
    assert_owner(&playlist.owner_id, &user, "playlist")?;

    state.db.delete_playlist(&playlist_id).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "playlist deleted successfully",
    ))
}

/// Append a video to a playlist (owner only)
///
/// Adding a video that is already present is a no-op.
pub async fn add_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((video_id, playlist_id)): Path<(EntityId, EntityId)>,
) -> Result<ApiResponse<PlaylistView>, AppError> {
    let playlist = state
        .db
        .get_playlist(&playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("playlist does not exist".to_string()))?;
    assert_owner(&playlist.owner_id, &user, "playlist")?;

    state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;

    state.db.add_playlist_video(&playlist_id, &video_id).await?;

    let view = state
        .db
        .playlist_view(&playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("playlist does not exist".to_string()))?;

    Ok(ApiResponse::ok(view, "video added to playlist"))
}

/// Remove a video from a playlist (owner only)
pub async fn remove_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((video_id, playlist_id)): Path<(EntityId, EntityId)>,
) -> Result<ApiResponse<PlaylistView>, AppError> {
    let playlist = state
        .db
        .get_playlist(&playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("playlist does not exist".to_string()))?;
    assert_owner(&playlist.owner_id, &user, "playlist")?;

    state
        .db
        .remove_playlist_video(&playlist_id, &video_id)
        .await?;

    let view = state
        .db
        .playlist_view(&playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("playlist does not exist".to_string()))?;

    Ok(ApiResponse::ok(view, "video removed from playlist"))
}

/// List a user's playlists with their membership counts
pub async fn user_playlists(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(user_id): Path<EntityId>,
) -> Result<ApiResponse<Vec<PlaylistSummary>>, AppError> {
    state
        .db
        .get_public_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user does not exist".to_string()))?;

    let playlists = state.db.user_playlists(&user_id).await?;

    Ok(ApiResponse::ok(playlists, "playlists fetched"))
}
