//! Media storage using an S3-compatible bucket
//!
//! Call contract: submit a local file path, receive back a public URL
//! or a failure. Callers own the local temporary file and must remove
//! it on both success and failure paths (temp files here are
//! `tempfile::NamedTempFile`s, so drop guarantees removal).
//!
//! The "local" backend copies files into a directory instead of a
//! bucket; it exists for development and tests, selected by
//! `storage.backend` in configuration.

use std::path::{Path, PathBuf};

use aws_sdk_s3::Client as S3Client;

use crate::config::StorageConfig;
use crate::error::AppError;

/// File extension for a MIME type, used when building storage keys
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        _ => "bin",
    }
}

enum Backend {
    S3 { client: S3Client, bucket: String },
    Local { root: PathBuf },
}

/// Media storage service
///
/// Uploads media and returns public URLs.
pub struct MediaStorage {
    backend: Backend,
    /// Public URL base, e.g. "https://media.example.com"
    public_url: String,
}

impl MediaStorage {
    /// Create a new media storage client from configuration
    ///
    /// # Errors
    /// Returns error if the backend cannot be initialized
    pub async fn new(config: &StorageConfig) -> Result<Self, AppError> {
        let backend = match config.backend.as_str() {
            "local" => {
                let root = config.local_dir.clone().ok_or_else(|| {
                    AppError::Config(
                        "storage.local_dir is required when storage.backend=local".to_string(),
                    )
                })?;
                std::fs::create_dir_all(&root)
                    .map_err(|e| AppError::Storage(format!("cannot create media dir: {e}")))?;
                Backend::Local { root }
            }
            _ => {
                use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

                let endpoint =
                    format!("https://{}.r2.cloudflarestorage.com", config.account_id);

                let credentials = Credentials::new(
                    &config.access_key_id,
                    &config.secret_access_key,
                    None,
                    None,
                    "cliptide-media",
                );

                let s3_config = aws_sdk_s3::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .region(Region::new("auto"))
                    .endpoint_url(&endpoint)
                    .credentials_provider(credentials)
                    .http_client(super::build_s3_http_client())
                    .build();

                Backend::S3 {
                    client: S3Client::from_conf(s3_config),
                    bucket: config.bucket.clone(),
                }
            }
        };

        Ok(Self {
            backend,
            public_url: config.public_url.clone(),
        })
    }

    /// Upload a local file
    ///
    /// # Arguments
    /// * `key` - Storage key (path) for the file
    /// * `path` - Local file to upload
    /// * `content_type` - MIME type
    ///
    /// # Returns
    /// Public URL for the uploaded file
    ///
    /// # Example
    /// ```ignore
    /// let url = storage
    ///     .upload_file("thumbnails/abc123.png", temp.path(), "image/png")
    ///     .await?;
    /// // Returns: https://media.example.com/thumbnails/abc123.png
    /// ```
    pub async fn upload_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<String, AppError> {
        let size = tokio::fs::metadata(path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);

        match &self.backend {
            Backend::S3 { client, bucket } => {
                use aws_sdk_s3::primitives::ByteStream;

                let body = ByteStream::from_path(path)
                    .await
                    .map_err(|e| AppError::Storage(format!("cannot read upload file: {e}")))?;

                client
                    .put_object()
                    .bucket(bucket)
                    .key(key)
                    .body(body)
                    .content_type(content_type)
                    .cache_control("public, max-age=31536000") // 1 year
                    .send()
                    .await
                    .map_err(|e| AppError::Storage(format!("media upload failed: {e}")))?;
            }
            Backend::Local { root } => {
                let target = root.join(key);
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| AppError::Storage(format!("media upload failed: {e}")))?;
                }
                tokio::fs::copy(path, &target)
                    .await
                    .map_err(|e| AppError::Storage(format!("media upload failed: {e}")))?;
            }
        }

        crate::metrics::MEDIA_UPLOADS_TOTAL.inc();
        crate::metrics::MEDIA_BYTES_UPLOADED.inc_by(size as f64);

        Ok(self.get_public_url(key))
    }

    /// Delete a media file
    pub async fn delete(&self, key: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::S3 { client, bucket } => {
                client
                    .delete_object()
                    .bucket(bucket)
                    .key(key)
                    .send()
                    .await
                    .map_err(|e| AppError::Storage(format!("media delete failed: {e}")))?;
            }
            Backend::Local { root } => {
                let target = root.join(key);
                if let Err(e) = tokio::fs::remove_file(&target).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        return Err(AppError::Storage(format!("media delete failed: {e}")));
                    }
                }
            }
        }

        Ok(())
    }

    /// Get the public URL for a storage key
    pub fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}
