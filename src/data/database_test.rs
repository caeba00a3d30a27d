//! Database tests

use super::*;
use crate::error::AppError;
use chrono::Utc;
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

fn test_user(username: &str) -> User {
    let now = Utc::now();
    User {
        id: EntityId::new(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        display_name: format!("{username} display"),
        password_hash: "$argon2id$test".to_string(),
        avatar_url: "https://media.test/avatars/x.png".to_string(),
        cover_image_url: None,
        refresh_token: None,
        created_at: now,
        updated_at: now,
    }
}

fn test_video(owner_id: &EntityId, title: &str) -> Video {
    let now = Utc::now();
    Video {
        id: EntityId::new(),
        owner_id: owner_id.clone(),
        video_url: "https://media.test/videos/x.mp4".to_string(),
        thumbnail_url: "https://media.test/thumbnails/x.png".to_string(),
        title: title.to_string(),
        description: "a test video".to_string(),
        duration: 42.0,
        views: 0,
        is_published: true,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
    // Connection successful if we get here without panicking
}

#[tokio::test]
async fn test_user_insert_and_get() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("alice");
    db.insert_user(&user).await.unwrap();

    let retrieved = db.get_user_by_id(&user.id).await.unwrap();
    assert!(retrieved.is_some());
    let retrieved = retrieved.unwrap();
    assert_eq!(retrieved.username, "alice");
    assert_eq!(retrieved.email, "alice@example.com");

    // Login lookup matches either column, case-insensitively
    let by_name = db.get_user_by_login("ALICE").await.unwrap();
    assert!(by_name.is_some());
    let by_email = db.get_user_by_login("alice@example.com").await.unwrap();
    assert_eq!(by_email.unwrap().id, user.id);
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let (db, _temp_dir) = create_test_db().await;

    db.insert_user(&test_user("bob")).await.unwrap();

    let mut duplicate = test_user("bob");
    duplicate.email = "other@example.com".to_string();
    let err = db.insert_user(&duplicate).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_refresh_token_lifecycle() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("carol");
    db.insert_user(&user).await.unwrap();

    db.update_refresh_token(&user.id, Some("token-1")).await.unwrap();
    let stored = db.get_user_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("token-1"));

    // Rotation overwrites, logout clears
    db.update_refresh_token(&user.id, Some("token-2")).await.unwrap();
    let stored = db.get_user_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("token-2"));

    db.update_refresh_token(&user.id, None).await.unwrap();
    let stored = db.get_user_by_id(&user.id).await.unwrap().unwrap();
    assert!(stored.refresh_token.is_none());
}

#[tokio::test]
async fn test_update_account_patches_only_provided_fields() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("dave");
    db.insert_user(&user).await.unwrap();

    db.update_account(&user.id, Some("Dave Grohl"), None)
        .await
        .unwrap();

    let stored = db.get_user_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.display_name, "Dave Grohl");
    assert_eq!(stored.email, "dave@example.com");
}

#[tokio::test]
async fn test_video_crud() {
    let (db, _temp_dir) = create_test_db().await;

    let owner = test_user("erin");
    db.insert_user(&owner).await.unwrap();

    let video = test_video(&owner.id, "first upload");
    db.insert_video(&video).await.unwrap();

    let retrieved = db.get_video(&video.id).await.unwrap().unwrap();
    assert_eq!(retrieved.title, "first upload");
    assert!(retrieved.is_published);

    db.update_video(&video.id, Some("renamed"), None, None)
        .await
        .unwrap();
    let retrieved = db.get_video(&video.id).await.unwrap().unwrap();
    assert_eq!(retrieved.title, "renamed");
    assert_eq!(retrieved.description, "a test video");

    db.set_publish_status(&video.id, false).await.unwrap();
    assert!(!db.get_video(&video.id).await.unwrap().unwrap().is_published);

    db.increment_views(&video.id).await.unwrap();
    db.increment_views(&video.id).await.unwrap();
    assert_eq!(db.get_video(&video.id).await.unwrap().unwrap().views, 2);

    db.delete_video(&video.id).await.unwrap();
    assert!(db.get_video(&video.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_like_toggle_round_trip() {
    let (db, _temp_dir) = create_test_db().await;

    let owner = test_user("frank");
    let liker = test_user("grace");
    db.insert_user(&owner).await.unwrap();
    db.insert_user(&liker).await.unwrap();

    let video = test_video(&owner.id, "likeable");
    db.insert_video(&video).await.unwrap();

    let liked = db
        .toggle_like(&liker.id, LikeTarget::Video, &video.id)
        .await
        .unwrap();
    assert!(liked);

    let liked = db
        .toggle_like(&liker.id, LikeTarget::Video, &video.id)
        .await
        .unwrap();
    assert!(!liked);
}

#[tokio::test]
async fn test_likes_on_different_targets_are_independent() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("heidi");
    db.insert_user(&user).await.unwrap();

    let video = test_video(&user.id, "v");
    db.insert_video(&video).await.unwrap();

    let now = Utc::now();
    let tweet = Tweet {
        id: EntityId::new(),
        owner_id: user.id.clone(),
        content: "hello".to_string(),
        created_at: now,
        updated_at: now,
    };
    db.insert_tweet(&tweet).await.unwrap();

    assert!(db.toggle_like(&user.id, LikeTarget::Video, &video.id).await.unwrap());
    assert!(db.toggle_like(&user.id, LikeTarget::Tweet, &tweet.id).await.unwrap());

    // Untoggling one leaves the other in place
    assert!(!db.toggle_like(&user.id, LikeTarget::Video, &video.id).await.unwrap());
    assert!(!db.toggle_like(&user.id, LikeTarget::Tweet, &tweet.id).await.unwrap());
}

#[tokio::test]
async fn test_subscription_toggle() {
    let (db, _temp_dir) = create_test_db().await;

    let channel = test_user("ivan");
    let viewer = test_user("judy");
    db.insert_user(&channel).await.unwrap();
    db.insert_user(&viewer).await.unwrap();

    assert!(db.toggle_subscription(&viewer.id, &channel.id).await.unwrap());
    assert!(db.is_subscribed(&viewer.id, &channel.id).await.unwrap());

    assert!(!db.toggle_subscription(&viewer.id, &channel.id).await.unwrap());
    assert!(!db.is_subscribed(&viewer.id, &channel.id).await.unwrap());
}

#[tokio::test]
async fn test_comment_crud() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("kate");
    db.insert_user(&user).await.unwrap();
    let video = test_video(&user.id, "commented");
    db.insert_video(&video).await.unwrap();

    let now = Utc::now();
    let comment = Comment {
        id: EntityId::new(),
        video_id: video.id.clone(),
        owner_id: user.id.clone(),
        content: "nice".to_string(),
        created_at: now,
        updated_at: now,
    };
    db.insert_comment(&comment).await.unwrap();

    db.update_comment(&comment.id, "very nice").await.unwrap();
    let stored = db.get_comment(&comment.id).await.unwrap().unwrap();
    assert_eq!(stored.content, "very nice");

    // Deleting the video cascades to its comments
    db.delete_video(&video.id).await.unwrap();
    assert!(db.get_comment(&comment.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_playlist_operations() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("leo");
    db.insert_user(&user).await.unwrap();

    let now = Utc::now();
    let playlist = Playlist {
        id: EntityId::new(),
        owner_id: user.id.clone(),
        name: "favourites".to_string(),
        description: String::new(),
        created_at: now,
        updated_at: now,
    };
    db.insert_playlist(&playlist).await.unwrap();

    // Same owner, same name: conflict
    let mut duplicate = playlist.clone();
    duplicate.id = EntityId::new();
    let err = db.insert_playlist(&duplicate).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let v1 = test_video(&user.id, "one");
    let v2 = test_video(&user.id, "two");
    db.insert_video(&v1).await.unwrap();
    db.insert_video(&v2).await.unwrap();

    assert!(db.add_playlist_video(&playlist.id, &v1.id).await.unwrap());
    assert!(db.add_playlist_video(&playlist.id, &v2.id).await.unwrap());
    // Re-adding is a no-op
    assert!(!db.add_playlist_video(&playlist.id, &v1.id).await.unwrap());

    assert!(db.remove_playlist_video(&playlist.id, &v1.id).await.unwrap());
    assert!(!db.remove_playlist_video(&playlist.id, &v1.id).await.unwrap());

    db.delete_playlist(&playlist.id).await.unwrap();
    assert!(db.get_playlist(&playlist.id).await.unwrap().is_none());
    // Membership rows are gone, the videos themselves stay
    assert!(db.get_video(&v2.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_watch_history_rewatch_bumps_timestamp() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("mallory");
    db.insert_user(&user).await.unwrap();
    let v1 = test_video(&user.id, "one");
    let v2 = test_video(&user.id, "two");
    db.insert_video(&v1).await.unwrap();
    db.insert_video(&v2).await.unwrap();

    db.record_watch(&user.id, &v1.id).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    db.record_watch(&user.id, &v2.id).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    db.record_watch(&user.id, &v1.id).await.unwrap();

    let history = db.watch_history(&user.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, v1.id);
    assert_eq!(history[1].id, v2.id);
}

#[tokio::test]
async fn test_dashboard_stats_zero_for_fresh_channel() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("nina");
    db.insert_user(&user).await.unwrap();

    let stats = db.dashboard_stats(&user.id).await.unwrap();
    assert_eq!(stats.total_videos, 0);
    assert_eq!(stats.total_views, 0);
    assert_eq!(stats.total_subscribers, 0);
    assert_eq!(stats.total_likes, 0);
}

#[tokio::test]
async fn test_dashboard_stats_counts() {
    let (db, _temp_dir) = create_test_db().await;

    let channel = test_user("oscar");
    let fan = test_user("peggy");
    db.insert_user(&channel).await.unwrap();
    db.insert_user(&fan).await.unwrap();

    let mut video = test_video(&channel.id, "popular");
    video.views = 7;
    db.insert_video(&video).await.unwrap();

    db.toggle_subscription(&fan.id, &channel.id).await.unwrap();
    db.toggle_like(&fan.id, LikeTarget::Video, &video.id).await.unwrap();

    let stats = db.dashboard_stats(&channel.id).await.unwrap();
    assert_eq!(stats.total_videos, 1);
    assert_eq!(stats.total_views, 7);
    assert_eq!(stats.total_subscribers, 1);
    assert_eq!(stats.total_likes, 1);
}

#[tokio::test]
async fn test_list_videos_filters_and_paginates() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("quinn");
    db.insert_user(&user).await.unwrap();

    for i in 0..3 {
        let mut video = test_video(&user.id, &format!("rust talk {i}"));
        video.views = i;
        db.insert_video(&video).await.unwrap();
    }
    let mut hidden = test_video(&user.id, "rust draft");
    hidden.is_published = false;
    db.insert_video(&hidden).await.unwrap();

    let page = db
        .list_videos(&VideoListQuery {
            text: Some("rust".to_string()),
            owner_id: None,
            sort_by: VideoSort::Views,
            ascending: false,
            page: 1,
            limit: 2,
        })
        .await
        .unwrap();

    // The unpublished draft never shows up
    assert_eq!(page.total, 3);
    assert_eq!(page.videos.len(), 2);
    assert_eq!(page.videos[0].views, 2);

    let page2 = db
        .list_videos(&VideoListQuery {
            text: Some("rust".to_string()),
            owner_id: None,
            sort_by: VideoSort::Views,
            ascending: false,
            page: 2,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(page2.videos.len(), 1);
}

#[tokio::test]
async fn test_listing_far_page_is_empty_not_a_panic() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("rosa");
    db.insert_user(&user).await.unwrap();
    let video = test_video(&user.id, "lonely clip");
    db.insert_video(&video).await.unwrap();

    // Page numbers come straight off the wire; u32::MAX must not
    // overflow the offset arithmetic
    let page = db
        .list_videos(&VideoListQuery {
            text: None,
            owner_id: None,
            sort_by: VideoSort::CreatedAt,
            ascending: false,
            page: u32::MAX,
            limit: 100,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert!(page.videos.is_empty());

    let comments = db
        .comments_for_video(&video.id, u32::MAX, 100)
        .await
        .unwrap();
    assert!(comments.is_empty());
}

#[tokio::test]
async fn test_channel_profile_counts_and_viewer_state() {
    let (db, _temp_dir) = create_test_db().await;

    let channel = test_user("ruth");
    let viewer = test_user("sybil");
    db.insert_user(&channel).await.unwrap();
    db.insert_user(&viewer).await.unwrap();

    db.toggle_subscription(&viewer.id, &channel.id).await.unwrap();
    db.toggle_subscription(&channel.id, &viewer.id).await.unwrap();

    let profile = db
        .channel_profile("ruth", Some(&viewer.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.subscriber_count, 1);
    assert_eq!(profile.channels_subscribed_to_count, 1);
    assert!(profile.is_subscribed);

    let anonymous = db.channel_profile("ruth", None).await.unwrap().unwrap();
    assert!(!anonymous.is_subscribed);

    assert!(db.channel_profile("nobody", None).await.unwrap().is_none());
}
