//! Read-model (view) queries
//!
//! The document store this API grew out of emulated joins with lookup
//! pipelines; here SQL joins are the join engine. Every function in this
//! module returns a typed view struct whose projection is the whole
//! contract: password and refresh-token columns never appear in any
//! SELECT list below.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::database::Database;
use super::models::{EntityId, Tweet, Video};
use crate::error::AppError;

// =============================================================================
// View structs
// =============================================================================

/// Public projection of a user
///
/// This is also the request identity attached by the authorization guard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: EntityId,
    pub username: String,
    pub email: String,
    #[serde(rename = "fullName")]
    pub display_name: String,
    #[serde(rename = "avatar")]
    pub avatar_url: String,
    #[serde(rename = "coverImage")]
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Minimal owner projection nested inside other views
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: EntityId,
    pub username: String,
    #[serde(rename = "fullName")]
    pub display_name: String,
    #[serde(rename = "avatar")]
    pub avatar_url: String,
}

/// A video with its owner resolved one level deep
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoWithOwner {
    pub id: EntityId,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub owner: OwnerSummary,
}

/// One page of a video listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPage {
    pub videos: Vec<VideoWithOwner>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

/// A comment with its author resolved
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithOwner {
    pub id: EntityId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: OwnerSummary,
}

/// Channel profile with subscription counts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: EntityId,
    pub username: String,
    #[serde(rename = "fullName")]
    pub display_name: String,
    #[serde(rename = "avatar")]
    pub avatar_url: String,
    #[serde(rename = "coverImage")]
    pub cover_image_url: Option<String>,
    pub subscriber_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
    pub created_at: DateTime<Utc>,
}

/// A subscription edge with the counterpart user resolved
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEntry {
    pub id: EntityId,
    pub user: OwnerSummary,
    pub subscribed_since: DateTime<Utc>,
}

/// A playlist row with its membership size
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub video_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A playlist with owner and ordered videos resolved
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistView {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub owner: OwnerSummary,
    pub videos: Vec<VideoWithOwner>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate channel stats for the dashboard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_videos: i64,
    pub total_views: i64,
    pub total_subscribers: i64,
    pub total_likes: i64,
}

/// Whitelisted sort columns for video listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSort {
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl VideoSort {
    /// Parse a query-string value; unknown values fall back to `CreatedAt`
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("views") => Self::Views,
            Some("duration") => Self::Duration,
            Some("title") => Self::Title,
            _ => Self::CreatedAt,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "v.created_at",
            Self::Views => "v.views",
            Self::Duration => "v.duration",
            Self::Title => "v.title",
        }
    }
}

/// Filter and paging parameters for `list_videos`
#[derive(Debug, Clone)]
pub struct VideoListQuery {
    pub text: Option<String>,
    pub owner_id: Option<EntityId>,
    pub sort_by: VideoSort,
    pub ascending: bool,
    pub page: u32,
    pub limit: u32,
}

// =============================================================================
// Row mapping helpers
// =============================================================================

/// Columns for a video joined with its owner, aliased `o_*`
const VIDEO_WITH_OWNER_COLUMNS: &str = "\
    v.id, v.video_url, v.thumbnail_url, v.title, v.description, \
    v.duration, v.views, v.is_published, v.created_at, \
    u.id AS o_id, u.username AS o_username, \
    u.display_name AS o_display_name, u.avatar_url AS o_avatar";

fn owner_from_row(row: &SqliteRow) -> Result<OwnerSummary, sqlx::Error> {
    Ok(OwnerSummary {
        id: row.try_get("o_id")?,
        username: row.try_get("o_username")?,
        display_name: row.try_get("o_display_name")?,
        avatar_url: row.try_get("o_avatar")?,
    })
}

fn video_with_owner_from_row(row: &SqliteRow) -> Result<VideoWithOwner, sqlx::Error> {
    Ok(VideoWithOwner {
        id: row.try_get("id")?,
        video_url: row.try_get("video_url")?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        duration: row.try_get("duration")?,
        views: row.try_get("views")?,
        is_published: row.try_get("is_published")?,
        created_at: row.try_get("created_at")?,
        owner: owner_from_row(row)?,
    })
}

// =============================================================================
// View queries
// =============================================================================

impl Database {
    /// Get the public projection of a user by ID
    pub async fn get_public_user(&self, id: &EntityId) -> Result<Option<PublicUser>, AppError> {
        let user = sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT id, username, email, display_name, avatar_url, cover_image_url, created_at
            FROM users WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Channel profile for a username, from the viewer's perspective
    ///
    /// `is_subscribed` is true iff a subscription exists with
    /// subscriber = viewer and channel = this user; an anonymous viewer
    /// always gets `false`.
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer: Option<&EntityId>,
    ) -> Result<Option<ChannelProfile>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT u.id, u.username, u.display_name, u.avatar_url, u.cover_image_url, u.created_at,
                   (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id)
                       AS subscriber_count,
                   (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id)
                       AS channels_subscribed_to_count,
                   EXISTS(SELECT 1 FROM subscriptions s
                          WHERE s.channel_id = u.id AND s.subscriber_id = ?)
                       AS is_subscribed
            FROM users u
            WHERE u.username = ?
            "#,
        )
        .bind(viewer)
        .bind(username.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(ChannelProfile {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            display_name: row.try_get("display_name")?,
            avatar_url: row.try_get("avatar_url")?,
            cover_image_url: row.try_get("cover_image_url")?,
            subscriber_count: row.try_get("subscriber_count")?,
            channels_subscribed_to_count: row.try_get("channels_subscribed_to_count")?,
            is_subscribed: row.try_get("is_subscribed")?,
            created_at: row.try_get("created_at")?,
        }))
    }

    /// List published videos with owners, filtered and paginated
    pub async fn list_videos(&self, query: &VideoListQuery) -> Result<VideoPage, AppError> {
        let pattern = query.text.as_ref().map(|t| format!("%{}%", t.trim()));
        let limit = query.limit.clamp(1, 100);
        let page = query.page.max(1);
        // Widen before multiplying; page comes straight from the query string
        let offset = i64::from(page - 1) * i64::from(limit);
        let order = if query.ascending { "ASC" } else { "DESC" };

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM videos v
            WHERE v.is_published = 1
              AND (?1 IS NULL OR v.title LIKE ?1 OR v.description LIKE ?1)
              AND (?2 IS NULL OR v.owner_id = ?2)
            "#,
        )
        .bind(&pattern)
        .bind(&query.owner_id)
        .fetch_one(&self.pool)
        .await?;

        // Sort column and order come from a whitelist, never from input.
        let sql = format!(
            r#"
            SELECT {VIDEO_WITH_OWNER_COLUMNS}
            FROM videos v
            JOIN users u ON u.id = v.owner_id
            WHERE v.is_published = 1
              AND (?1 IS NULL OR v.title LIKE ?1 OR v.description LIKE ?1)
              AND (?2 IS NULL OR v.owner_id = ?2)
            ORDER BY {sort} {order}
            LIMIT ?3 OFFSET ?4
            "#,
            sort = query.sort_by.column(),
        );

        let rows = sqlx::query(&sql)
            .bind(&pattern)
            .bind(&query.owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let videos = rows
            .iter()
            .map(video_with_owner_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(VideoPage {
            videos,
            page,
            limit,
            total,
        })
    }

    /// A single video with its owner resolved
    pub async fn get_video_with_owner(
        &self,
        id: &EntityId,
    ) -> Result<Option<VideoWithOwner>, AppError> {
        let sql = format!(
            r#"
            SELECT {VIDEO_WITH_OWNER_COLUMNS}
            FROM videos v
            JOIN users u ON u.id = v.owner_id
            WHERE v.id = ?
            "#
        );

        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;

        Ok(row.as_ref().map(video_with_owner_from_row).transpose()?)
    }

    /// The viewer's watch history, most recently watched first
    pub async fn watch_history(&self, user_id: &EntityId) -> Result<Vec<VideoWithOwner>, AppError> {
        let sql = format!(
            r#"
            SELECT {VIDEO_WITH_OWNER_COLUMNS}
            FROM watch_history w
            JOIN videos v ON v.id = w.video_id
            JOIN users u ON u.id = v.owner_id
            WHERE w.user_id = ?
            ORDER BY w.watched_at DESC
            "#
        );

        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(video_with_owner_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Published videos the user has liked, most recently liked first
    pub async fn liked_videos(&self, liker_id: &EntityId) -> Result<Vec<VideoWithOwner>, AppError> {
        let sql = format!(
            r#"
            SELECT {VIDEO_WITH_OWNER_COLUMNS}
            FROM likes l
            JOIN videos v ON v.id = l.video_id
            JOIN users u ON u.id = v.owner_id
            WHERE l.liker_id = ? AND l.video_id IS NOT NULL AND v.is_published = 1
            ORDER BY l.created_at DESC
            "#
        );

        let rows = sqlx::query(&sql).bind(liker_id).fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(video_with_owner_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Comments on a video with their authors, newest first
    pub async fn comments_for_video(
        &self,
        video_id: &EntityId,
        page: u32,
        limit: u32,
    ) -> Result<Vec<CommentWithOwner>, AppError> {
        let limit = limit.clamp(1, 100);
        let offset = i64::from(page.max(1) - 1) * i64::from(limit);

        let rows = sqlx::query(
            r#"
            SELECT c.id, c.content, c.created_at, c.updated_at,
                   u.id AS o_id, u.username AS o_username,
                   u.display_name AS o_display_name, u.avatar_url AS o_avatar
            FROM comments c
            JOIN users u ON u.id = c.owner_id
            WHERE c.video_id = ?
            ORDER BY c.created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(video_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let comments = rows
            .iter()
            .map(|row| {
                Ok::<_, sqlx::Error>(CommentWithOwner {
                    id: row.try_get("id")?,
                    content: row.try_get("content")?,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                    owner: owner_from_row(row)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    /// Users subscribed to a channel, newest subscription first
    pub async fn channel_subscribers(
        &self,
        channel_id: &EntityId,
    ) -> Result<Vec<SubscriptionEntry>, AppError> {
        self.subscription_entries(
            r#"
            SELECT s.id, s.created_at AS subscribed_since,
                   u.id AS o_id, u.username AS o_username,
                   u.display_name AS o_display_name, u.avatar_url AS o_avatar
            FROM subscriptions s
            JOIN users u ON u.id = s.subscriber_id
            WHERE s.channel_id = ?
            ORDER BY s.created_at DESC
            "#,
            channel_id,
        )
        .await
    }

    /// Channels a user is subscribed to, newest subscription first
    pub async fn subscribed_channels(
        &self,
        subscriber_id: &EntityId,
    ) -> Result<Vec<SubscriptionEntry>, AppError> {
        self.subscription_entries(
            r#"
            SELECT s.id, s.created_at AS subscribed_since,
                   u.id AS o_id, u.username AS o_username,
                   u.display_name AS o_display_name, u.avatar_url AS o_avatar
            FROM subscriptions s
            JOIN users u ON u.id = s.channel_id
            WHERE s.subscriber_id = ?
            ORDER BY s.created_at DESC
            "#,
            subscriber_id,
        )
        .await
    }

    async fn subscription_entries(
        &self,
        sql: &str,
        scope: &EntityId,
    ) -> Result<Vec<SubscriptionEntry>, AppError> {
        let rows = sqlx::query(sql).bind(scope).fetch_all(&self.pool).await?;

        let entries = rows
            .iter()
            .map(|row| {
                Ok::<_, sqlx::Error>(SubscriptionEntry {
                    id: row.try_get("id")?,
                    user: owner_from_row(row)?,
                    subscribed_since: row.try_get("subscribed_since")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// A user's tweets, newest first
    pub async fn user_tweets(&self, owner_id: &EntityId) -> Result<Vec<Tweet>, AppError> {
        let tweets = sqlx::query_as::<_, Tweet>(
            "SELECT * FROM tweets WHERE owner_id = ? ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tweets)
    }

    /// A user's playlists with their membership sizes
    pub async fn user_playlists(
        &self,
        owner_id: &EntityId,
    ) -> Result<Vec<PlaylistSummary>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.name, p.description, p.created_at, p.updated_at,
                   (SELECT COUNT(*) FROM playlist_videos pv WHERE pv.playlist_id = p.id)
                       AS video_count
            FROM playlists p
            WHERE p.owner_id = ?
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        let playlists = rows
            .iter()
            .map(|row| {
                Ok::<_, sqlx::Error>(PlaylistSummary {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    description: row.try_get("description")?,
                    video_count: row.try_get("video_count")?,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(playlists)
    }

    /// A playlist with its owner and ordered videos resolved
    pub async fn playlist_view(&self, id: &EntityId) -> Result<Option<PlaylistView>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT p.id, p.name, p.description, p.created_at, p.updated_at,
                   u.id AS o_id, u.username AS o_username,
                   u.display_name AS o_display_name, u.avatar_url AS o_avatar
            FROM playlists p
            JOIN users u ON u.id = p.owner_id
            WHERE p.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let sql = format!(
            r#"
            SELECT {VIDEO_WITH_OWNER_COLUMNS}
            FROM playlist_videos pv
            JOIN videos v ON v.id = pv.video_id
            JOIN users u ON u.id = v.owner_id
            WHERE pv.playlist_id = ?
            ORDER BY pv.position ASC
            "#
        );

        let video_rows = sqlx::query(&sql).bind(id).fetch_all(&self.pool).await?;
        let videos = video_rows
            .iter()
            .map(video_with_owner_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(PlaylistView {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            owner: owner_from_row(&row)?,
            videos,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    /// Aggregate stats for the dashboard, scoped to one owner
    ///
    /// "Likes received" resolves each like's target (video, comment or
    /// tweet) and counts those whose owner is this user, via three left
    /// joins combined with OR. Every aggregate defaults to zero when no
    /// group exists.
    pub async fn dashboard_stats(&self, owner_id: &EntityId) -> Result<DashboardStats, AppError> {
        let (total_videos, total_views, total_subscribers, total_likes) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM videos v WHERE v.owner_id = ?1),
                    COALESCE((SELECT SUM(v.views) FROM videos v WHERE v.owner_id = ?1), 0),
                    (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = ?1),
                    (SELECT COUNT(*)
                     FROM likes l
                     LEFT JOIN videos lv ON lv.id = l.video_id
                     LEFT JOIN comments lc ON lc.id = l.comment_id
                     LEFT JOIN tweets lt ON lt.id = l.tweet_id
                     WHERE lv.owner_id = ?1 OR lc.owner_id = ?1 OR lt.owner_id = ?1)
                "#,
            )
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(DashboardStats {
            total_videos,
            total_views,
            total_subscribers,
            total_likes,
        })
    }

    /// All of an owner's videos for the dashboard, unpublished included
    pub async fn channel_videos(&self, owner_id: &EntityId) -> Result<Vec<Video>, AppError> {
        let videos = sqlx::query_as::<_, Video>(
            "SELECT * FROM videos WHERE owner_id = ? ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }
}
