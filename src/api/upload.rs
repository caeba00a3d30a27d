//! Multipart upload spooling
//!
//! File fields are spooled to named temporary files so the storage
//! collaborator can upload from a local path. Dropping the
//! `UploadedFile` removes the temporary file, on success and failure
//! paths alike.

use axum::extract::multipart::Field;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::error::AppError;

/// A multipart file field spooled to disk
pub struct UploadedFile {
    pub file: NamedTempFile,
    pub content_type: String,
}

impl UploadedFile {
    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }
}

/// Spool one multipart file field to a temporary file
pub async fn spool_field(mut field: Field<'_>) -> Result<UploadedFile, AppError> {
    let content_type = field
        .content_type()
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let file = NamedTempFile::new()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("cannot create temp file: {e}")))?;

    // Write through an async handle so large chunks never block the
    // runtime; the NamedTempFile itself stays around for Drop cleanup
    let mut writer = file
        .as_file()
        .try_clone()
        .map(tokio::fs::File::from_std)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("cannot spool upload: {e}")))?;

    let mut size: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        size += chunk.len() as u64;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("cannot spool upload: {e}")))?;
    }
    writer
        .flush()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("cannot spool upload: {e}")))?;

    if size == 0 {
        return Err(AppError::BadRequest("uploaded file is empty".to_string()));
    }

    Ok(UploadedFile { file, content_type })
}
