//! API layer
//!
//! HTTP handlers, one module per resource collection, composed into a
//! versioned router. Routes are split into public and authenticated
//! groups; the authenticated group sits behind the authorization guard.

mod comments;
mod dashboard;
mod healthcheck;
mod likes;
mod playlists;
mod response;
mod subscriptions;
mod tweets;
mod upload;
mod users;
mod videos;

pub use response::ApiResponse;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::AppState;
use crate::auth::require_auth;

/// Create the versioned API router
///
/// Public routes: healthcheck, registration, login, token refresh,
/// channel profiles and the published-video listing. Everything else
/// requires a valid access credential.
pub fn api_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/v1/healthcheck", get(healthcheck::healthcheck))
        .route("/v1/users/register", post(users::register))
        .route("/v1/users/login", post(users::login))
        .route("/v1/users/refresh-token", post(users::refresh_token))
        // Channel profile adapts to the viewer but never requires one
        .route("/v1/users/c/:username", get(users::channel_profile))
        .route("/v1/videos", get(videos::list_videos));

    let authenticated_routes = Router::new()
        // Users
        .route("/v1/users/logout", post(users::logout))
        .route("/v1/users/current-user", get(users::current_user))
        .route("/v1/users/change-password", post(users::change_password))
        .route("/v1/users/update-account", patch(users::update_account))
        .route("/v1/users/avatar", patch(users::update_avatar))
        .route("/v1/users/cover-image", patch(users::update_cover_image))
        .route("/v1/users/history", get(users::watch_history))
        // Videos
        .route("/v1/videos", post(videos::publish_video))
        .route(
            "/v1/videos/:videoId",
            get(videos::get_video)
                .patch(videos::update_video)
                .delete(videos::delete_video),
        )
        .route(
            "/v1/videos/toggle/publish/:videoId",
            patch(videos::toggle_publish),
        )
        // Comments
        .route(
            "/v1/comments/:videoId",
            get(comments::video_comments).post(comments::add_comment),
        )
        .route(
            "/v1/comments/c/:commentId",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
        // Tweets
        .route("/v1/tweets", post(tweets::create_tweet))
        .route("/v1/tweets/user/:userId", get(tweets::user_tweets))
        .route(
            "/v1/tweets/:tweetId",
            patch(tweets::update_tweet).delete(tweets::delete_tweet),
        )
        // Likes
        .route("/v1/likes/toggle/v/:videoId", post(likes::toggle_video_like))
        .route(
            "/v1/likes/toggle/c/:commentId",
            post(likes::toggle_comment_like),
        )
        .route("/v1/likes/toggle/t/:tweetId", post(likes::toggle_tweet_like))
        .route("/v1/likes/videos", get(likes::liked_videos))
        // Subscriptions
        .route(
            "/v1/subscriptions/c/:channelId",
            post(subscriptions::toggle_subscription).get(subscriptions::channel_subscribers),
        )
        .route(
            "/v1/subscriptions/u/:subscriberId",
            get(subscriptions::subscribed_channels),
        )
        // Playlists
        .route("/v1/playlists", post(playlists::create_playlist))
        .route(
            "/v1/playlists/:playlistId",
            get(playlists::get_playlist)
                .patch(playlists::update_playlist)
                .delete(playlists::delete_playlist),
        )
        .route(
            "/v1/playlists/add/:videoId/:playlistId",
            patch(playlists::add_video),
        )
        .route(
            "/v1/playlists/remove/:videoId/:playlistId",
            patch(playlists::remove_video),
        )
        .route("/v1/playlists/user/:userId", get(playlists::user_playlists))
        // Dashboard
        .route("/v1/dashboard/stats", get(dashboard::stats))
        .route("/v1/dashboard/videos", get(dashboard::channel_videos))
        .layer(middleware::from_fn_with_state(state, require_auth));

    public_routes.merge(authenticated_routes)
}
