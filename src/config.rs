//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)
//!
//! The resulting `AppConfig` is built once at startup and shared
//! through `AppState`; business logic never reads ambient state.

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Public domain (e.g., "video.example.com")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Get the base URL for the instance
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Media storage configuration (S3-compatible bucket)
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Storage backend: "s3" or "local"
    pub backend: String,
    /// Bucket name
    pub bucket: String,
    /// Public URL base for uploaded media (e.g., "https://media.example.com")
    pub public_url: String,
    /// S3-compatible endpoint account id
    pub account_id: String,
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Root directory for the "local" backend
    pub local_dir: Option<PathBuf>,
}

/// Authentication configuration
///
/// Access tokens are short-lived and stateless; refresh tokens are
/// longer-lived and persisted per user. The two use separate secrets.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for access tokens
    pub access_token_secret: String,
    /// Access token lifetime in seconds (default: 1 day)
    pub access_token_ttl_seconds: i64,
    /// HMAC secret for refresh tokens
    pub refresh_token_secret: String,
    /// Refresh token lifetime in seconds (default: 10 days)
    pub refresh_token_ttl_seconds: i64,
    /// Mark credential cookies `Secure` (disable only for local http)
    pub secure_cookies: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format ("pretty" or "json")
    pub format: String,
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// # Errors
    /// Returns error if required values are missing or malformed
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.protocol", "http")?
            .set_default("storage.backend", "s3")?
            .set_default("auth.access_token_ttl_seconds", 86_400)?
            .set_default("auth.refresh_token_ttl_seconds", 864_000)?
            .set_default("auth.secure_cookies", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (CLIPTIDE__*)
            .add_source(
                Environment::with_prefix("CLIPTIDE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.server.domain.is_empty() {
            return Err(crate::error::AppError::Config(
                "server.domain must not be empty".to_string(),
            ));
        }
        if self.auth.access_token_secret.len() < 32 {
            return Err(crate::error::AppError::Config(
                "auth.access_token_secret must be at least 32 bytes".to_string(),
            ));
        }
        if self.auth.refresh_token_secret.len() < 32 {
            return Err(crate::error::AppError::Config(
                "auth.refresh_token_secret must be at least 32 bytes".to_string(),
            ));
        }
        if self.auth.access_token_secret == self.auth.refresh_token_secret {
            return Err(crate::error::AppError::Config(
                "access and refresh token secrets must differ".to_string(),
            ));
        }
        match self.storage.backend.as_str() {
            "s3" => {}
            "local" => {
                if self.storage.local_dir.is_none() {
                    return Err(crate::error::AppError::Config(
                        "storage.local_dir is required when storage.backend=local".to_string(),
                    ));
                }
            }
            other => {
                return Err(crate::error::AppError::Config(format!(
                    "storage.backend must be \"s3\" or \"local\", got {other:?}"
                )));
            }
        }
        if self.auth.access_token_ttl_seconds <= 0 || self.auth.refresh_token_ttl_seconds <= 0 {
            return Err(crate::error::AppError::Config(
                "token lifetimes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
