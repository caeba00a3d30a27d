//! Authorization guard
//!
//! Protects routes that require authentication. The guard verifies the
//! access credential, loads the identity from the database with a
//! projection that excludes the password hash and refresh token, and
//! attaches it to the request context. Absence of identity is always a
//! terminal failure for protected routes.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, Request, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use super::token::verify_access_token;
use crate::AppState;
use crate::data::PublicUser;
use crate::error::AppError;

/// The authenticated identity attached to request extensions
pub type Identity = PublicUser;

/// Access token cookie name
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// Refresh token cookie name
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
        .or_else(|| {
            let jar = CookieJar::from_headers(headers);
            jar.get(ACCESS_TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_owned())
        })
}

/// Verify an access token and load the identity it names
async fn authenticate_token(token: &str, state: &AppState) -> Result<Identity, AppError> {
    let claims = verify_access_token(token, &state.config.auth)?;

    state
        .db
        .get_public_user(&claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid access token".to_string()))
}

/// Middleware to require authentication
///
/// Extracts and verifies the access token from the `access_token`
/// cookie or Authorization header. Adds the identity to request
/// extensions if valid.
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/v1/...", ...)
///     .layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token_from_headers(request.headers())
        .ok_or_else(|| AppError::Unauthorized("missing access token".to_string()))?;

    // Verify token and load identity
    let identity = authenticate_token(&token, &state).await?;

    // Add identity to request extensions
    request.extensions_mut().insert(identity);

    // Continue to next handler
    Ok(next.run(request).await)
}

/// Extractor for the current authenticated user
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    /// Extract the current user from the request
    ///
    /// Uses the identity attached by `require_auth` when present and
    /// falls back to verifying headers directly.
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>().cloned() {
            return Ok(CurrentUser(identity));
        }

        let state = AppState::from_ref(state);
        let token = extract_token_from_headers(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("missing access token".to_string()))?;
        let identity = authenticate_token(&token, &state).await?;
        parts.extensions.insert(identity.clone());

        Ok(CurrentUser(identity))
    }
}

/// Optional current user extractor
///
/// Returns None if not authenticated, instead of an error. Used for
/// views whose shape depends on the viewer (e.g. channel profile
/// `isSubscribed`).
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Identity>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>().cloned() {
            return Ok(MaybeUser(Some(identity)));
        }

        let app_state = AppState::from_ref(state);
        let identity = match extract_token_from_headers(&parts.headers) {
            Some(token) => authenticate_token(&token, &app_state).await.ok(),
            None => None,
        };

        if let Some(identity) = &identity {
            parts.extensions.insert(identity.clone());
        }

        Ok(MaybeUser(identity))
    }
}
