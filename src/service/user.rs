//! User service
//!
//! Registration, login, session rotation and account maintenance.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::auth::{self, TokenPair};
use crate::config::AppConfig;
use crate::data::{Database, EntityId, PublicUser, User};
use crate::error::AppError;
use crate::storage::{MediaStorage, extension_for};

/// Input for user registration
///
/// The avatar is required; the cover image is optional. Paths point at
/// local temporary files owned by the caller.
pub struct RegisterInput<'a> {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub avatar: (&'a Path, String),
    pub cover_image: Option<(&'a Path, String)>,
}

/// User service
pub struct UserService {
    db: Arc<Database>,
    storage: Arc<MediaStorage>,
    config: Arc<AppConfig>,
}

impl UserService {
    /// Create new user service
    pub fn new(db: Arc<Database>, storage: Arc<MediaStorage>, config: Arc<AppConfig>) -> Self {
        Self {
            db,
            storage,
            config,
        }
    }

    /// Register a new user
    ///
    /// Uploads the avatar (and optional cover image), hashes the
    /// password and inserts the user row. Returns the public projection
    /// (never the password hash or refresh token).
    ///
    /// # Errors
    /// - `Validation` if any required field is blank
    /// - `Conflict` if the username or email is taken
    /// - `BadRequest` if a required upload fails terminally
    pub async fn register(&self, input: RegisterInput<'_>) -> Result<PublicUser, AppError> {
        let username = input.username.trim().to_lowercase();
        let email = input.email.trim().to_lowercase();
        let display_name = input.display_name.trim().to_string();

        let mut field_errors = Vec::new();
        if username.is_empty() {
            field_errors.push("username is required".to_string());
        }
        if email.is_empty() || !email.contains('@') {
            field_errors.push("a valid email is required".to_string());
        }
        if display_name.is_empty() {
            field_errors.push("fullName is required".to_string());
        }
        if input.password.len() < 8 {
            field_errors.push("password must be at least 8 characters".to_string());
        }
        if !field_errors.is_empty() {
            return Err(AppError::Validation {
                message: "invalid registration data".to_string(),
                errors: field_errors,
            });
        }

        let id = EntityId::new();

        // Upload failure for the required avatar is terminal for the
        // registration; the caller surfaces it as a 400-class error.
        let (avatar_path, avatar_type) = input.avatar;
        let avatar_key = format!("avatars/{}.{}", id, extension_for(&avatar_type));
        let avatar_url = self
            .storage
            .upload_file(&avatar_key, avatar_path, &avatar_type)
            .await?;

        let cover_image_url = match input.cover_image {
            Some((path, content_type)) => {
                let key = format!("covers/{}.{}", id, extension_for(&content_type));
                Some(self.storage.upload_file(&key, path, &content_type).await?)
            }
            None => None,
        };

        let now = Utc::now();
        let user = User {
            id,
            username,
            email,
            display_name,
            password_hash: auth::hash_password(&input.password)?,
            avatar_url,
            cover_image_url,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };

        self.db.insert_user(&user).await?;

        tracing::info!(username = %user.username, "User registered");

        // Multi-step write: the insert succeeded, so a failure here is a
        // distinct error, not a rollback.
        self.db
            .get_public_user(&user.id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("registered user vanished")))
    }

    /// Log a user in with username or email plus password
    ///
    /// Issues a token pair and persists the new refresh token.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<(PublicUser, TokenPair), AppError> {
        let invalid = || AppError::Unauthorized("invalid credentials".to_string());

        let user = self
            .db
            .get_user_by_login(identifier)
            .await?
            .ok_or_else(invalid)?;

        if !auth::verify_password(password, &user.password_hash)? {
            return Err(invalid());
        }

        let pair = self.issue_and_store(&user).await?;
        let public = self
            .db
            .get_public_user(&user.id)
            .await?
            .ok_or_else(invalid)?;

        tracing::info!(username = %public.username, "User logged in");

        Ok((public, pair))
    }

    /// Log a user out by clearing the stored refresh token
    ///
    /// The outstanding refresh token becomes unusable immediately;
    /// access tokens expire on their own.
    pub async fn logout(&self, user_id: &EntityId) -> Result<(), AppError> {
        self.db.update_refresh_token(user_id, None).await?;
        Ok(())
    }

    /// Exchange a refresh token for a fresh access/refresh pair
    ///
    /// The presented token must verify and match the one stored for the
    /// user; a superseded or already-used token fails `Unauthorized`.
    /// Concurrent renewals with the same stale token both observe the
    /// mismatch after the first rotation wins.
    pub async fn refresh_session(&self, presented: &str) -> Result<TokenPair, AppError> {
        let claims = auth::verify_refresh_token(presented, &self.config.auth)?;

        let user = self
            .db
            .get_user_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid refresh token".to_string()))?;

        if user.refresh_token.as_deref() != Some(presented) {
            return Err(AppError::Unauthorized(
                "refresh token is expired or already used".to_string(),
            ));
        }

        // Rotate: issue a fresh pair and overwrite the stored token
        self.issue_and_store(&user).await
    }

    /// Change a user's password after verifying the current one
    pub async fn change_password(
        &self,
        user_id: &EntityId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if new_password.len() < 8 {
            return Err(AppError::BadRequest(
                "new password must be at least 8 characters".to_string(),
            ));
        }

        let user = self
            .db
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        if !auth::verify_password(old_password, &user.password_hash)? {
            return Err(AppError::Unauthorized(
                "current password is incorrect".to_string(),
            ));
        }

        self.db
            .update_password(user_id, &auth::hash_password(new_password)?)
            .await?;

        Ok(())
    }

    /// Upload and set a new avatar for a user
    pub async fn update_avatar(
        &self,
        user_id: &EntityId,
        path: &Path,
        content_type: &str,
    ) -> Result<PublicUser, AppError> {
        let key = format!(
            "avatars/{}-{}.{}",
            user_id,
            EntityId::new(),
            extension_for(content_type)
        );
        let url = self.storage.upload_file(&key, path, content_type).await?;
        self.db.update_avatar(user_id, &url).await?;

        self.db
            .get_public_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))
    }

    /// Upload and set a new cover image for a user
    pub async fn update_cover_image(
        &self,
        user_id: &EntityId,
        path: &Path,
        content_type: &str,
    ) -> Result<PublicUser, AppError> {
        let key = format!(
            "covers/{}-{}.{}",
            user_id,
            EntityId::new(),
            extension_for(content_type)
        );
        let url = self.storage.upload_file(&key, path, content_type).await?;
        self.db.update_cover_image(user_id, &url).await?;

        self.db
            .get_public_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))
    }

    /// Issue a token pair and persist the refresh token on the user row
    async fn issue_and_store(&self, user: &User) -> Result<TokenPair, AppError> {
        let pair = auth::issue_token_pair(user, &self.config.auth)?;
        self.db
            .update_refresh_token(&user.id, Some(&pair.refresh_token))
            .await?;
        Ok(pair)
    }
}
