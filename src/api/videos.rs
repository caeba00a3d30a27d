//! Video endpoints
//!
//! Publishing, listing, fetching (with watch tracking), mutation and
//! publish toggling. All mutations run the existence check first, then
//! the ownership check, then the update.

use axum::extract::{Multipart, Path, Query, State};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::{CurrentUser, assert_owner};
use crate::data::{EntityId, VideoListQuery, VideoPage, VideoSort, VideoWithOwner};
use crate::error::AppError;
use crate::metrics::{HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL};
use crate::service::{PublishInput, VideoService};
use crate::storage::extension_for;

use super::response::ApiResponse;
use super::upload::{UploadedFile, spool_field};

/// Listing query parameters
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Free-text filter over title and description
    pub query: Option<String>,
    /// Restrict to one owner's videos
    pub user_id: Option<String>,
    pub sort_by: Option<String>,
    /// "asc" or "desc" (default)
    pub sort_type: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishStatusPayload {
    pub id: EntityId,
    pub is_published: bool,
}

/// List published videos with owners, filtered and paginated
pub async fn list_videos(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<ApiResponse<VideoPage>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/v1/videos"])
        .start_timer();

    let page = state
        .db
        .list_videos(&VideoListQuery {
            text: params.query.filter(|q| !q.trim().is_empty()),
            owner_id: params.user_id.map(EntityId::from),
            sort_by: VideoSort::parse(params.sort_by.as_deref()),
            ascending: params.sort_type.as_deref() == Some("asc"),
            page: params.page.unwrap_or(1),
            limit: params.limit.unwrap_or(10),
        })
        .await?;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/api/v1/videos", "200"])
        .inc();

    Ok(ApiResponse::ok(page, "videos fetched"))
}

/// Publish a new video
///
/// Multipart form: `title`, `description`, a `videoFile` and a
/// `thumbnail` (both required), and an optional `duration` in seconds.
/// Missing files fail before anything is uploaded or persisted.
pub async fn publish_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<ApiResponse<VideoWithOwner>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/v1/videos"])
        .start_timer();

    let mut title = None;
    let mut description = None;
    let mut duration = None;
    let mut video_file: Option<UploadedFile> = None;
    let mut thumbnail: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(ToOwned::to_owned);
        match name.as_deref() {
            Some("title") => title = Some(read_text(field).await?),
            Some("description") => description = Some(read_text(field).await?),
            Some("duration") => {
                let raw = read_text(field).await?;
                duration = Some(raw.trim().parse::<f64>().map_err(|_| {
                    AppError::BadRequest("duration must be a number of seconds".to_string())
                })?);
            }
            Some("videoFile") => video_file = Some(spool_field(field).await?),
            Some("thumbnail") => thumbnail = Some(spool_field(field).await?),
            _ => {}
        }
    }

    let video_file =
        video_file.ok_or_else(|| AppError::BadRequest("videoFile is required".to_string()))?;
    let thumbnail =
        thumbnail.ok_or_else(|| AppError::BadRequest("thumbnail file is required".to_string()))?;

    let video = VideoService::new(state.db.clone(), state.storage.clone())
        .publish(
            &user.id,
            PublishInput {
                title: title.unwrap_or_default(),
                description: description.unwrap_or_default(),
                duration,
                video_file: (video_file.path(), video_file.content_type.clone()),
                thumbnail: (thumbnail.path(), thumbnail.content_type.clone()),
            },
        )
        .await?;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/api/v1/videos", "201"])
        .inc();

    Ok(ApiResponse::created(video, "video published successfully"))
}

/// Fetch a video by id
///
/// Unpublished videos are visible to their owner only. A successful
/// fetch counts as a view and lands in the viewer's watch history.
pub async fn get_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<EntityId>,
) -> Result<ApiResponse<VideoWithOwner>, AppError> {
    let video = state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;

    // Hidden videos look absent to everyone but the owner
    if !video.is_published && video.owner_id != user.id {
        return Err(AppError::NotFound("video does not exist".to_string()));
    }

    state.db.increment_views(&video_id).await?;
    state.db.record_watch(&user.id, &video_id).await?;

    let view = state
        .db
        .get_video_with_owner(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;

    Ok(ApiResponse::ok(view, "video fetched"))
}

/// Update a video's title, description and/or thumbnail
///
/// Multipart form with optional `title` and `description` text fields
/// and an optional `thumbnail` file.
pub async fn update_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<EntityId>,
    mut multipart: Multipart,
) -> Result<ApiResponse<VideoWithOwner>, AppError> {
    let video = state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;
    assert_owner(&video.owner_id, &user, "video")?;

    let mut title = None;
    let mut description = None;
    let mut thumbnail: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(ToOwned::to_owned);
        match name.as_deref() {
            Some("title") => title = Some(read_text(field).await?),
            Some("description") => description = Some(read_text(field).await?),
            Some("thumbnail") => thumbnail = Some(spool_field(field).await?),
            _ => {}
        }
    }

    if title.is_none() && description.is_none() && thumbnail.is_none() {
        return Err(AppError::BadRequest(
            "nothing to update: provide title, description or thumbnail".to_string(),
        ));
    }

    let thumbnail_url = match &thumbnail {
        Some(file) => {
            let key = format!(
                "thumbnails/{}-{}.{}",
                video_id,
                EntityId::new(),
                extension_for(&file.content_type)
            );
            Some(
                state
                    .storage
                    .upload_file(&key, file.path(), &file.content_type)
                    .await?,
            )
        }
        None => None,
    };

    state
        .db
        .update_video(
            &video_id,
            title.as_deref(),
            description.as_deref(),
            thumbnail_url.as_deref(),
        )
        .await?;

    let view = state
        .db
        .get_video_with_owner(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;

    Ok(ApiResponse::ok(view, "video updated successfully"))
}

/// Delete a video
///
/// Media files are removed best-effort after the row is gone.
pub async fn delete_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<EntityId>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let video = state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;
    assert_owner(&video.owner_id, &user, "video")?;

    state.db.delete_video(&video_id).await?;

    for url in [&video.video_url, &video.thumbnail_url] {
        if let Some(key) = storage_key(&state, url) {
            if let Err(error) = state.storage.delete(&key).await {
                tracing::warn!(%error, key, "Failed to delete media for removed video");
            }
        }
    }

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "video deleted successfully",
    ))
}

/// Toggle a video's publish flag
pub async fn toggle_publish(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<EntityId>,
) -> Result<ApiResponse<PublishStatusPayload>, AppError> {
    let video = state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;
    assert_owner(&video.owner_id, &user, "video")?;

    let is_published = !video.is_published;
    state.db.set_publish_status(&video_id, is_published).await?;

    Ok(ApiResponse::ok(
        PublishStatusPayload {
            id: video.id,
            is_published,
        },
        "publish status toggled",
    ))
}

/// Extract the storage key from one of our own public media URLs
fn storage_key(state: &AppState, url: &str) -> Option<String> {
    url.strip_prefix(&format!("{}/", state.config.storage.public_url))
        .map(ToOwned::to_owned)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))
}
