//! Token service
//!
//! HMAC-signed credentials in the format
//! `base64url(payload).base64url(hmac_sha256(payload_b64))`.
//!
//! Access tokens are short-lived, stateless, and carry an identity
//! snapshot. Refresh tokens are longer-lived, carry only the user id,
//! and are persisted on the user row; the stored copy is the single
//! live session secret per user.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::config::AuthConfig;
use crate::data::{EntityId, User};
use crate::error::AppError;

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id
    pub sub: EntityId,
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// User id
    pub sub: EntityId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A freshly issued access/refresh credential pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issue a new access/refresh pair for a user
///
/// The caller is responsible for persisting the refresh token on the
/// user row (rotation is an overwrite, never an append).
pub fn issue_token_pair(user: &User, auth: &AuthConfig) -> Result<TokenPair, AppError> {
    let now = Utc::now();

    let access = AccessClaims {
        sub: user.id.clone(),
        email: user.email.clone(),
        username: user.username.clone(),
        display_name: user.display_name.clone(),
        issued_at: now,
        expires_at: now + Duration::seconds(auth.access_token_ttl_seconds),
    };
    let refresh = RefreshClaims {
        sub: user.id.clone(),
        issued_at: now,
        expires_at: now + Duration::seconds(auth.refresh_token_ttl_seconds),
    };

    Ok(TokenPair {
        access_token: sign_claims(&access, &auth.access_token_secret)?,
        refresh_token: sign_claims(&refresh, &auth.refresh_token_secret)?,
    })
}

/// Verify an access token and return its claims
pub fn verify_access_token(token: &str, auth: &AuthConfig) -> Result<AccessClaims, AppError> {
    let claims: AccessClaims = verify_claims(token, &auth.access_token_secret)?;
    if claims.expires_at < Utc::now() {
        return Err(AppError::Unauthorized("access token expired".to_string()));
    }
    Ok(claims)
}

/// Verify a refresh token and return its claims
pub fn verify_refresh_token(token: &str, auth: &AuthConfig) -> Result<RefreshClaims, AppError> {
    let claims: RefreshClaims = verify_claims(token, &auth.refresh_token_secret)?;
    if claims.expires_at < Utc::now() {
        return Err(AppError::Unauthorized("refresh token expired".to_string()));
    }
    Ok(claims)
}

/// Create a signed token from serializable claims
///
/// Token format: base64url(payload).base64url(hmac_sha256(payload_b64))
fn sign_claims<T: Serialize>(claims: &T, secret: &str) -> Result<String, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Serialize claims to JSON
    let payload = serde_json::to_string(claims).map_err(|e| AppError::Internal(e.into()))?;

    // 2. Base64 encode the payload
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    // 3. Create HMAC-SHA256 signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid HMAC key: {e}")))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    // 4. Return "{payload}.{signature}"
    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify a token signature and decode its claims
///
/// Expiry is checked by the typed wrappers above, not here.
fn verify_claims<T: DeserializeOwned>(token: &str, secret: &str) -> Result<T, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let unauthorized = || AppError::Unauthorized("invalid token".to_string());

    // 1. Split token into payload and signature
    let (payload_b64, signature_b64) = token.split_once('.').ok_or_else(unauthorized)?;

    // 2. Verify HMAC signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid HMAC key: {e}")))?;
    mac.update(payload_b64.as_bytes());

    let expected_signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| unauthorized())?;

    mac.verify_slice(&expected_signature)
        .map_err(|_| unauthorized())?;

    // 3. Decode and deserialize payload
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| unauthorized())?;

    serde_json::from_slice(&payload_bytes).map_err(|_| unauthorized())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_auth_config() -> AuthConfig {
        AuthConfig {
            access_token_secret: "access-secret-0123456789abcdef0123456789".to_string(),
            access_token_ttl_seconds: 3600,
            refresh_token_secret: "refresh-secret-0123456789abcdef012345678".to_string(),
            refresh_token_ttl_seconds: 864_000,
            secure_cookies: false,
        }
    }

    fn test_user() -> User {
        let now = Utc::now();
        User {
            id: EntityId::new(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            display_name: "Alice".to_string(),
            password_hash: "hash".to_string(),
            avatar_url: "https://media.example.com/avatars/a.png".to_string(),
            cover_image_url: None,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issued_pair_round_trips() {
        let auth = test_auth_config();
        let user = test_user();

        let pair = issue_token_pair(&user, &auth).unwrap();

        let access = verify_access_token(&pair.access_token, &auth).unwrap();
        assert_eq!(access.sub, user.id);
        assert_eq!(access.username, "alice");

        let refresh = verify_refresh_token(&pair.refresh_token, &auth).unwrap();
        assert_eq!(refresh.sub, user.id);
    }

    #[test]
    fn tokens_are_not_interchangeable() {
        let auth = test_auth_config();
        let pair = issue_token_pair(&test_user(), &auth).unwrap();

        // A refresh token must not verify as an access token and vice versa
        assert!(verify_access_token(&pair.refresh_token, &auth).is_err());
        assert!(verify_refresh_token(&pair.access_token, &auth).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let auth = test_auth_config();
        let pair = issue_token_pair(&test_user(), &auth).unwrap();

        let mut tampered = pair.access_token.clone();
        tampered.push('x');
        assert!(verify_access_token(&tampered, &auth).is_err());
    }

    #[test]
    fn expired_access_token_is_rejected() {
        let mut auth = test_auth_config();
        auth.access_token_ttl_seconds = -1;
        let pair = issue_token_pair(&test_user(), &auth).unwrap();

        let err = verify_access_token(&pair.access_token, &auth).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
