//! E2E tests for likes, subscriptions, comments and tweets

mod common;

use common::TestServer;

#[tokio::test]
async fn test_video_like_toggle_parity() {
    let server = TestServer::new().await;
    let owner = server.register_and_login("alice").await;
    let fan = server.register_and_login("bob").await;

    let video_id = server.publish_video(&owner, "likeable").await;
    let url = server.url(&format!("/api/v1/likes/toggle/v/{video_id}"));

    let response = server
        .client
        .post(&url)
        .bearer_auth(&fan.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["liked"], true);

    let response = server
        .client
        .post(&url)
        .bearer_auth(&fan.access_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["liked"], false);
}

#[tokio::test]
async fn test_liked_videos_listing() {
    let server = TestServer::new().await;
    let owner = server.register_and_login("carol").await;
    let fan = server.register_and_login("dave").await;

    let liked = server.publish_video(&owner, "liked one").await;
    server.publish_video(&owner, "ignored one").await;

    server
        .client
        .post(server.url(&format!("/api/v1/likes/toggle/v/{liked}")))
        .bearer_auth(&fan.access_token)
        .send()
        .await
        .unwrap();

    let response = server
        .client
        .get(server.url("/api/v1/likes/videos"))
        .bearer_auth(&fan.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let videos = body["data"].as_array().unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0]["id"], liked.as_str());
    assert_eq!(videos[0]["owner"]["username"], "carol");
}

#[tokio::test]
async fn test_like_missing_target_is_not_found() {
    let server = TestServer::new().await;
    let session = server.register_and_login("erin").await;

    let response = server
        .client
        .post(server.url("/api/v1/likes/toggle/c/does-not-exist"))
        .bearer_auth(&session.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_subscription_toggle_and_self_subscribe() {
    let server = TestServer::new().await;
    let channel = server.register_and_login("frank").await;
    let viewer = server.register_and_login("grace").await;

    let url = server.url(&format!("/api/v1/subscriptions/c/{}", channel.user_id));

    let response = server
        .client
        .post(&url)
        .bearer_auth(&viewer.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["subscribed"], true);

    let response = server
        .client
        .post(&url)
        .bearer_auth(&viewer.access_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["subscribed"], false);

    // Your own channel is off limits
    let response = server
        .client
        .post(&url)
        .bearer_auth(&channel.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_subscriber_and_subscribed_listings() {
    let server = TestServer::new().await;
    let channel = server.register_and_login("heidi").await;
    let fan = server.register_and_login("ivan").await;

    server
        .client
        .post(server.url(&format!("/api/v1/subscriptions/c/{}", channel.user_id)))
        .bearer_auth(&fan.access_token)
        .send()
        .await
        .unwrap();

    let response = server
        .client
        .get(server.url(&format!("/api/v1/subscriptions/c/{}", channel.user_id)))
        .bearer_auth(&channel.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let subscribers = body["data"].as_array().unwrap();
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0]["user"]["username"], "ivan");

    let response = server
        .client
        .get(server.url(&format!("/api/v1/subscriptions/u/{}", fan.user_id)))
        .bearer_auth(&fan.access_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    let channels = body["data"].as_array().unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0]["user"]["username"], "heidi");
}

#[tokio::test]
async fn test_comment_lifecycle() {
    let server = TestServer::new().await;
    let owner = server.register_and_login("judy").await;
    let commenter = server.register_and_login("kate").await;

    let video_id = server.publish_video(&owner, "discussed").await;

    let response = server
        .client
        .post(server.url(&format!("/api/v1/comments/{video_id}")))
        .bearer_auth(&commenter.access_token)
        .json(&serde_json::json!({"content": "first!"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    let comment_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = server
        .client
        .get(server.url(&format!("/api/v1/comments/{video_id}")))
        .bearer_auth(&owner.access_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    let comments = body["data"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["content"], "first!");
    assert_eq!(comments[0]["owner"]["username"], "kate");

    // Only the author can edit, even the video owner cannot
    let response = server
        .client
        .patch(server.url(&format!("/api/v1/comments/c/{comment_id}")))
        .bearer_auth(&owner.access_token)
        .json(&serde_json::json!({"content": "edited"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = server
        .client
        .patch(server.url(&format!("/api/v1/comments/c/{comment_id}")))
        .bearer_auth(&commenter.access_token)
        .json(&serde_json::json!({"content": "edited"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = server
        .client
        .delete(server.url(&format!("/api/v1/comments/c/{comment_id}")))
        .bearer_auth(&commenter.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_comment_on_missing_video() {
    let server = TestServer::new().await;
    let session = server.register_and_login("leo").await;

    let response = server
        .client
        .post(server.url("/api/v1/comments/no-such-video"))
        .bearer_auth(&session.access_token)
        .json(&serde_json::json!({"content": "hello?"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_empty_comment_is_rejected() {
    let server = TestServer::new().await;
    let session = server.register_and_login("mallory").await;
    let video_id = server.publish_video(&session, "quiet").await;

    let response = server
        .client
        .post(server.url(&format!("/api/v1/comments/{video_id}")))
        .bearer_auth(&session.access_token)
        .json(&serde_json::json!({"content": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_tweet_lifecycle() {
    let server = TestServer::new().await;
    let author = server.register_and_login("nina").await;
    let other = server.register_and_login("oscar").await;

    let response = server
        .client
        .post(server.url("/api/v1/tweets"))
        .bearer_auth(&author.access_token)
        .json(&serde_json::json!({"content": "shipping today"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    let tweet_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = server
        .client
        .get(server.url(&format!("/api/v1/tweets/user/{}", author.user_id)))
        .bearer_auth(&other.access_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = server
        .client
        .delete(server.url(&format!("/api/v1/tweets/{tweet_id}")))
        .bearer_auth(&other.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = server
        .client
        .delete(server.url(&format!("/api/v1/tweets/{tweet_id}")))
        .bearer_auth(&author.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_tweet_like_toggle() {
    let server = TestServer::new().await;
    let author = server.register_and_login("peggy").await;
    let fan = server.register_and_login("quinn").await;

    let response = server
        .client
        .post(server.url("/api/v1/tweets"))
        .bearer_auth(&author.access_token)
        .json(&serde_json::json!({"content": "like this"}))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    let tweet_id = body["data"]["id"].as_str().unwrap().to_string();

    let url = server.url(&format!("/api/v1/likes/toggle/t/{tweet_id}"));
    let response = server
        .client
        .post(&url)
        .bearer_auth(&fan.access_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["liked"], true);
}
