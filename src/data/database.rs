//! SQLite database operations
//!
//! All write-path database access goes through this module. Read models
//! that join across collections live in `views.rs`.

use std::path::Path;

use chrono::Utc;
use sqlx::{Pool, Sqlite, SqlitePool};

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pub(super) pool: Pool<Sqlite>,
}

fn track(operation: &'static str, table: &'static str) {
    crate::metrics::DB_QUERIES_TOTAL
        .with_label_values(&[operation, table])
        .inc();
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        // Foreign keys are off by default in SQLite
        sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user
    ///
    /// # Errors
    /// Returns `Conflict` if the username or email is already taken.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        track("insert", "users");
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, display_name, password_hash,
                avatar_url, cover_image_url, refresh_token, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(&user.avatar_url)
        .bind(&user.cover_image_url)
        .bind(&user.refresh_token)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "username or email already in use"))?;

        Ok(())
    }

    /// Get a user by ID, including credential columns
    ///
    /// Only the auth and service layers should see the full row.
    pub async fn get_user_by_id(&self, id: &EntityId) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Look up a user by username or email for login
    ///
    /// The identifier is matched case-insensitively (both columns are
    /// stored lowercase).
    pub async fn get_user_by_login(&self, identifier: &str) -> Result<Option<User>, AppError> {
        let identifier = identifier.trim().to_lowercase();
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ? OR email = ?")
                .bind(&identifier)
                .bind(&identifier)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    /// Overwrite the stored refresh token for a user
    ///
    /// Issuing a new refresh token invalidates the prior one implicitly;
    /// `None` clears the session (logout). This touches no other columns,
    /// so it can never fail on unrelated constraints.
    pub async fn update_refresh_token(
        &self,
        id: &EntityId,
        refresh_token: Option<&str>,
    ) -> Result<bool, AppError> {
        track("update", "users");
        let result =
            sqlx::query("UPDATE users SET refresh_token = ?, updated_at = ? WHERE id = ?")
                .bind(refresh_token)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Replace a user's password hash
    pub async fn update_password(
        &self,
        id: &EntityId,
        password_hash: &str,
    ) -> Result<bool, AppError> {
        track("update", "users");
        let result =
            sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
                .bind(password_hash)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Patch account fields (display name and/or email)
    ///
    /// Use `None` for omitted fields (no change).
    ///
    /// # Errors
    /// Returns `Conflict` if the new email is already taken.
    pub async fn update_account(
        &self,
        id: &EntityId,
        display_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<bool, AppError> {
        track("update", "users");
        let email = email.map(|e| e.trim().to_lowercase());
        let result = sqlx::query(
            r#"
            UPDATE users
            SET display_name = COALESCE(?, display_name),
                email = COALESCE(?, email),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(display_name)
        .bind(email)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "email already in use"))?;

        Ok(result.rows_affected() == 1)
    }

    /// Replace a user's avatar URL
    pub async fn update_avatar(&self, id: &EntityId, avatar_url: &str) -> Result<bool, AppError> {
        track("update", "users");
        let result = sqlx::query("UPDATE users SET avatar_url = ?, updated_at = ? WHERE id = ?")
            .bind(avatar_url)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Replace a user's cover image URL
    pub async fn update_cover_image(
        &self,
        id: &EntityId,
        cover_image_url: &str,
    ) -> Result<bool, AppError> {
        track("update", "users");
        let result =
            sqlx::query("UPDATE users SET cover_image_url = ?, updated_at = ? WHERE id = ?")
                .bind(cover_image_url)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Videos
    // =========================================================================

    /// Insert a new video
    pub async fn insert_video(&self, video: &Video) -> Result<(), AppError> {
        track("insert", "videos");
        sqlx::query(
            r#"
            INSERT INTO videos (
                id, owner_id, video_url, thumbnail_url, title, description,
                duration, views, is_published, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&video.id)
        .bind(&video.owner_id)
        .bind(&video.video_url)
        .bind(&video.thumbnail_url)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.duration)
        .bind(video.views)
        .bind(video.is_published)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a video by ID
    pub async fn get_video(&self, id: &EntityId) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    /// Patch video fields (title, description, thumbnail)
    ///
    /// Use `None` for omitted fields (no change).
    pub async fn update_video(
        &self,
        id: &EntityId,
        title: Option<&str>,
        description: Option<&str>,
        thumbnail_url: Option<&str>,
    ) -> Result<bool, AppError> {
        track("update", "videos");
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET title = COALESCE(?, title),
                description = COALESCE(?, description),
                thumbnail_url = COALESCE(?, thumbnail_url),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(thumbnail_url)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete a video (cascades to comments, likes, playlist membership)
    pub async fn delete_video(&self, id: &EntityId) -> Result<bool, AppError> {
        track("delete", "videos");
        let result = sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Set the publish flag on a video
    pub async fn set_publish_status(
        &self,
        id: &EntityId,
        is_published: bool,
    ) -> Result<bool, AppError> {
        track("update", "videos");
        let result = sqlx::query("UPDATE videos SET is_published = ?, updated_at = ? WHERE id = ?")
            .bind(is_published)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Increment a video's view counter
    pub async fn increment_views(&self, id: &EntityId) -> Result<(), AppError> {
        track("update", "videos");
        sqlx::query("UPDATE videos SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Watch history
    // =========================================================================

    /// Record that a user watched a video
    ///
    /// Re-watching bumps the timestamp so the history stays ordered
    /// most-recent-first.
    pub async fn record_watch(&self, user_id: &EntityId, video_id: &EntityId) -> Result<(), AppError> {
        track("insert", "watch_history");
        sqlx::query(
            r#"
            INSERT INTO watch_history (user_id, video_id, watched_at)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id, video_id) DO UPDATE SET watched_at = excluded.watched_at
            "#,
        )
        .bind(user_id)
        .bind(video_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Insert a new comment
    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        track("insert", "comments");
        sqlx::query(
            r#"
            INSERT INTO comments (id, video_id, owner_id, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.video_id)
        .bind(&comment.owner_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a comment by ID
    pub async fn get_comment(&self, id: &EntityId) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    /// Replace a comment's content
    pub async fn update_comment(&self, id: &EntityId, content: &str) -> Result<bool, AppError> {
        track("update", "comments");
        let result = sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
            .bind(content)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete a comment
    pub async fn delete_comment(&self, id: &EntityId) -> Result<bool, AppError> {
        track("delete", "comments");
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Tweets
    // =========================================================================

    /// Insert a new tweet
    pub async fn insert_tweet(&self, tweet: &Tweet) -> Result<(), AppError> {
        track("insert", "tweets");
        sqlx::query(
            r#"
            INSERT INTO tweets (id, owner_id, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tweet.id)
        .bind(&tweet.owner_id)
        .bind(&tweet.content)
        .bind(tweet.created_at)
        .bind(tweet.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a tweet by ID
    pub async fn get_tweet(&self, id: &EntityId) -> Result<Option<Tweet>, AppError> {
        let tweet = sqlx::query_as::<_, Tweet>("SELECT * FROM tweets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tweet)
    }

    /// Replace a tweet's content
    pub async fn update_tweet(&self, id: &EntityId, content: &str) -> Result<bool, AppError> {
        track("update", "tweets");
        let result = sqlx::query("UPDATE tweets SET content = ?, updated_at = ? WHERE id = ?")
            .bind(content)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete a tweet
    pub async fn delete_tweet(&self, id: &EntityId) -> Result<bool, AppError> {
        track("delete", "tweets");
        let result = sqlx::query("DELETE FROM tweets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Toggle a like on a target entity
    ///
    /// Presence of the row is the state: an existing like is removed, a
    /// missing one is inserted. Two concurrent toggles for the same pair
    /// can both observe "not liked yet"; the partial unique index makes
    /// the losing insert fail, which we report as the liked state.
    ///
    /// # Returns
    /// `true` if the entity is liked after the toggle, `false` otherwise.
    pub async fn toggle_like(
        &self,
        liker_id: &EntityId,
        target: LikeTarget,
        target_id: &EntityId,
    ) -> Result<bool, AppError> {
        let column = target.column();

        track("delete", "likes");
        let deleted = sqlx::query(&format!(
            "DELETE FROM likes WHERE liker_id = ? AND {column} = ?"
        ))
        .bind(liker_id)
        .bind(target_id)
        .execute(&self.pool)
        .await?;

        if deleted.rows_affected() > 0 {
            return Ok(false);
        }

        track("insert", "likes");
        let insert = sqlx::query(&format!(
            "INSERT INTO likes (id, liker_id, {column}, created_at) VALUES (?, ?, ?, ?)"
        ))
        .bind(EntityId::new())
        .bind(liker_id)
        .bind(target_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match insert {
            Ok(_) => Ok(true),
            // Lost a toggle race; the like exists now, which is what the
            // caller asked for.
            Err(e) if crate::error::is_unique_violation(&e) => Ok(true),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Toggle a subscription on a channel
    ///
    /// Same toggle contract as likes: the UNIQUE (subscriber, channel)
    /// constraint resolves concurrent toggles at the storage level.
    ///
    /// # Returns
    /// `true` if subscribed after the toggle, `false` otherwise.
    pub async fn toggle_subscription(
        &self,
        subscriber_id: &EntityId,
        channel_id: &EntityId,
    ) -> Result<bool, AppError> {
        track("delete", "subscriptions");
        let deleted = sqlx::query(
            "DELETE FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await?;

        if deleted.rows_affected() > 0 {
            return Ok(false);
        }

        track("insert", "subscriptions");
        let insert = sqlx::query(
            "INSERT INTO subscriptions (id, subscriber_id, channel_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(EntityId::new())
        .bind(subscriber_id)
        .bind(channel_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match insert {
            Ok(_) => Ok(true),
            Err(e) if crate::error::is_unique_violation(&e) => Ok(true),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// Check whether a subscription exists
    pub async fn is_subscribed(
        &self,
        subscriber_id: &EntityId,
        channel_id: &EntityId,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?)",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists != 0)
    }

    // =========================================================================
    // Playlists
    // =========================================================================

    /// Insert a new playlist
    ///
    /// # Errors
    /// Returns `Conflict` if the owner already has a playlist with this name.
    pub async fn insert_playlist(&self, playlist: &Playlist) -> Result<(), AppError> {
        track("insert", "playlists");
        sqlx::query(
            r#"
            INSERT INTO playlists (id, owner_id, name, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&playlist.id)
        .bind(&playlist.owner_id)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(playlist.created_at)
        .bind(playlist.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "you already have a playlist with this name"))?;

        Ok(())
    }

    /// Get a playlist by ID
    pub async fn get_playlist(&self, id: &EntityId) -> Result<Option<Playlist>, AppError> {
        let playlist = sqlx::query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(playlist)
    }

    /// Patch playlist fields (name and/or description)
    ///
    /// # Errors
    /// Returns `Conflict` if the new name collides with another playlist
    /// of the same owner.
    pub async fn update_playlist(
        &self,
        id: &EntityId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<bool, AppError> {
        track("update", "playlists");
        let result = sqlx::query(
            r#"
            UPDATE playlists
            SET name = COALESCE(?, name),
                description = COALESCE(?, description),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "you already have a playlist with this name"))?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete a playlist (cascades to its video membership)
    pub async fn delete_playlist(&self, id: &EntityId) -> Result<bool, AppError> {
        track("delete", "playlists");
        let result = sqlx::query("DELETE FROM playlists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Append a video to a playlist
    ///
    /// The video is placed after the current last position. Adding a
    /// video that is already in the playlist is a no-op.
    ///
    /// # Returns
    /// `true` if the video was added, `false` if it was already present.
    pub async fn add_playlist_video(
        &self,
        playlist_id: &EntityId,
        video_id: &EntityId,
    ) -> Result<bool, AppError> {
        track("insert", "playlist_videos");
        let result = sqlx::query(
            r#"
            INSERT INTO playlist_videos (playlist_id, video_id, position, added_at)
            SELECT ?1, ?2,
                   COALESCE((SELECT MAX(position) + 1 FROM playlist_videos WHERE playlist_id = ?1), 0),
                   ?3
            WHERE TRUE
            ON CONFLICT (playlist_id, video_id) DO NOTHING
            "#,
        )
        .bind(playlist_id)
        .bind(video_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Remove a video from a playlist
    ///
    /// # Returns
    /// `true` if the video was removed, `false` if it was not in the playlist.
    pub async fn remove_playlist_video(
        &self,
        playlist_id: &EntityId,
        video_id: &EntityId,
    ) -> Result<bool, AppError> {
        track("delete", "playlist_videos");
        let result =
            sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = ? AND video_id = ?")
                .bind(playlist_id)
                .bind(video_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }
}
