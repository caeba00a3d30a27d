//! Video service
//!
//! Video publishing: media upload orchestration plus persistence.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::data::{Database, EntityId, Video, VideoWithOwner};
use crate::error::AppError;
use crate::storage::{MediaStorage, extension_for};

/// Input for publishing a video
///
/// Both files are required. Paths point at local temporary files owned
/// by the caller; they are removed on all exit paths when the caller's
/// `NamedTempFile`s drop.
pub struct PublishInput<'a> {
    pub title: String,
    pub description: String,
    /// Duration in seconds, when the client knows it
    pub duration: Option<f64>,
    pub video_file: (&'a Path, String),
    pub thumbnail: (&'a Path, String),
}

/// Video service
pub struct VideoService {
    db: Arc<Database>,
    storage: Arc<MediaStorage>,
}

impl VideoService {
    /// Create new video service
    pub fn new(db: Arc<Database>, storage: Arc<MediaStorage>) -> Self {
        Self { db, storage }
    }

    /// Publish a new video
    ///
    /// Uploads the video file and thumbnail, then inserts the video row
    /// with the publish flag set. Upload failure for either asset is
    /// terminal; nothing is persisted in that case.
    pub async fn publish(
        &self,
        owner_id: &EntityId,
        input: PublishInput<'_>,
    ) -> Result<VideoWithOwner, AppError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::BadRequest("title is required".to_string()));
        }

        let id = EntityId::new();

        let (video_path, video_type) = input.video_file;
        let video_key = format!("videos/{}.{}", id, extension_for(&video_type));
        let video_url = self
            .storage
            .upload_file(&video_key, video_path, &video_type)
            .await?;

        let (thumb_path, thumb_type) = input.thumbnail;
        let thumb_key = format!("thumbnails/{}.{}", id, extension_for(&thumb_type));
        let thumbnail_url = self
            .storage
            .upload_file(&thumb_key, thumb_path, &thumb_type)
            .await?;

        let now = Utc::now();
        let video = Video {
            id,
            owner_id: owner_id.clone(),
            video_url,
            thumbnail_url,
            title,
            description: input.description.trim().to_string(),
            duration: input.duration.unwrap_or(0.0).max(0.0),
            views: 0,
            is_published: true,
            created_at: now,
            updated_at: now,
        };

        self.db.insert_video(&video).await?;

        tracing::info!(video_id = %video.id, owner = %owner_id, "Video published");

        self.db
            .get_video_with_owner(&video.id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("published video vanished")))
    }
}
