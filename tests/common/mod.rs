//! Common test utilities for E2E tests

use cliptide::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const TEST_PASSWORD: &str = "correct horse battery";

/// Credentials returned by the login helpers
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: String,
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    ///
    /// Uses the "local" storage backend so media uploads land in the
    /// temp directory instead of a bucket.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let media_dir = temp_dir.path().join("media");

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "test.example.com".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
            },
            storage: config::StorageConfig {
                backend: "local".to_string(),
                bucket: "test-media".to_string(),
                public_url: "https://media.test.example.com".to_string(),
                account_id: "test-account".to_string(),
                access_key_id: "test-key".to_string(),
                secret_access_key: "test-secret".to_string(),
                local_dir: Some(media_dir),
            },
            auth: config::AuthConfig {
                access_token_secret: "access-secret-key-32-bytes-long!".to_string(),
                access_token_ttl_seconds: 3600,
                refresh_token_secret: "refresh-secret-key-32-bytes-ok!!".to_string(),
                refresh_token_ttl_seconds: 86400,
                secure_cookies: false,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        let state = AppState::new(config).await.unwrap();

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = cliptide::build_router(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// A minimal valid registration form for the given username
    pub fn registration_form(&self, username: &str) -> reqwest::multipart::Form {
        reqwest::multipart::Form::new()
            .text("username", username.to_string())
            .text("email", format!("{username}@example.com"))
            .text("fullName", format!("{username} display"))
            .text("password", TEST_PASSWORD.to_string())
            .part(
                "avatar",
                reqwest::multipart::Part::bytes(b"fake png bytes".to_vec())
                    .file_name("avatar.png")
                    .mime_str("image/png")
                    .unwrap(),
            )
    }

    /// Register a user through the API and return the response body
    pub async fn register(&self, username: &str) -> serde_json::Value {
        let response = self
            .client
            .post(self.url("/api/v1/users/register"))
            .multipart(self.registration_form(username))
            .send()
            .await
            .expect("register request succeeds");
        assert_eq!(response.status(), 201, "registration failed");
        response.json().await.expect("register response body")
    }

    /// Log in an already-registered user
    pub async fn login(&self, username: &str) -> AuthSession {
        let response = self
            .client
            .post(self.url("/api/v1/users/login"))
            .json(&serde_json::json!({
                "username": username,
                "password": TEST_PASSWORD,
            }))
            .send()
            .await
            .expect("login request succeeds");
        assert_eq!(response.status(), 200, "login failed");

        let body: serde_json::Value = response.json().await.expect("login response body");
        let data = &body["data"];
        AuthSession {
            user_id: data["user"]["id"].as_str().expect("user id").to_string(),
            username: username.to_string(),
            access_token: data["accessToken"].as_str().expect("access token").to_string(),
            refresh_token: data["refreshToken"]
                .as_str()
                .expect("refresh token")
                .to_string(),
        }
    }

    /// Register a user and log them in
    pub async fn register_and_login(&self, username: &str) -> AuthSession {
        self.register(username).await;
        self.login(username).await
    }

    /// Publish a video as the given session and return its id
    pub async fn publish_video(&self, session: &AuthSession, title: &str) -> String {
        let form = reqwest::multipart::Form::new()
            .text("title", title.to_string())
            .text("description", "an e2e test video".to_string())
            .text("duration", "12.5".to_string())
            .part(
                "videoFile",
                reqwest::multipart::Part::bytes(b"fake mp4 bytes".to_vec())
                    .file_name("clip.mp4")
                    .mime_str("video/mp4")
                    .unwrap(),
            )
            .part(
                "thumbnail",
                reqwest::multipart::Part::bytes(b"fake png bytes".to_vec())
                    .file_name("thumb.png")
                    .mime_str("image/png")
                    .unwrap(),
            );

        let response = self
            .client
            .post(self.url("/api/v1/videos"))
            .bearer_auth(&session.access_token)
            .multipart(form)
            .send()
            .await
            .expect("publish request succeeds");
        assert_eq!(response.status(), 201, "publish failed");

        let body: serde_json::Value = response.json().await.expect("publish response body");
        body["data"]["id"].as_str().expect("video id").to_string()
    }
}
