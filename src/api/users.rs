//! User endpoints
//!
//! Registration, session lifecycle, account maintenance, channel
//! profiles and watch history.

use axum::extract::{Multipart, Path, State};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::{
    ACCESS_TOKEN_COOKIE, CurrentUser, MaybeUser, REFRESH_TOKEN_COOKIE, TokenPair,
};
use crate::data::{ChannelProfile, PublicUser, VideoWithOwner};
use crate::error::AppError;
use crate::metrics::{HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL};
use crate::service::{RegisterInput, UserService};

use super::response::ApiResponse;
use super::upload::{UploadedFile, spool_field};

fn user_service(state: &AppState) -> UserService {
    UserService::new(state.db.clone(), state.storage.clone(), state.config.clone())
}

/// Login request: username or email plus password
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

/// Refresh request for non-browser clients
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Account patch: display name and/or email
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// Login/refresh payload; tokens are also set as cookies
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    pub access_token: String,
    pub refresh_token: String,
}

/// Both credential cookies for a token pair
fn credential_cookies(pair: &TokenPair, secure: bool) -> [Cookie<'static>; 2] {
    let build = |name: &'static str, value: String| {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax)
            .build()
    };

    [
        build(ACCESS_TOKEN_COOKIE, pair.access_token.clone()),
        build(REFRESH_TOKEN_COOKIE, pair.refresh_token.clone()),
    ]
}

fn set_credential_cookies(jar: CookieJar, pair: &TokenPair, secure: bool) -> CookieJar {
    let [access, refresh] = credential_cookies(pair, secure);
    jar.add(access).add(refresh)
}

fn clear_credential_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((ACCESS_TOKEN_COOKIE, "")).path("/").build())
        .remove(Cookie::build((REFRESH_TOKEN_COOKIE, "")).path("/").build())
}

/// Register a new user
///
/// Multipart form: `username`, `email`, `fullName`, `password`, an
/// `avatar` file (required) and a `coverImage` file (optional).
pub async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/v1/users/register"])
        .start_timer();

    let mut username = None;
    let mut email = None;
    let mut display_name = None;
    let mut password = None;
    let mut avatar: Option<UploadedFile> = None;
    let mut cover_image: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(ToOwned::to_owned);
        match name.as_deref() {
            Some("username") => username = Some(read_text(field).await?),
            Some("email") => email = Some(read_text(field).await?),
            Some("fullName") => display_name = Some(read_text(field).await?),
            Some("password") => password = Some(read_text(field).await?),
            Some("avatar") => avatar = Some(spool_field(field).await?),
            Some("coverImage") => cover_image = Some(spool_field(field).await?),
            _ => {}
        }
    }

    let avatar =
        avatar.ok_or_else(|| AppError::BadRequest("avatar file is required".to_string()))?;

    let user = user_service(&state)
        .register(RegisterInput {
            username: username.unwrap_or_default(),
            email: email.unwrap_or_default(),
            display_name: display_name.unwrap_or_default(),
            password: password.unwrap_or_default(),
            avatar: (avatar.path(), avatar.content_type.clone()),
            cover_image: cover_image
                .as_ref()
                .map(|c| (c.path(), c.content_type.clone())),
        })
        .await?;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/api/v1/users/register", "201"])
        .inc();

    Ok(ApiResponse::created(user, "user registered successfully"))
}

/// Log in with username or email plus password
///
/// Sets both credential cookies and returns the pair in the payload
/// for non-browser clients.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    axum::Json(req): axum::Json<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<AuthPayload>), AppError> {
    let identifier = req
        .username
        .or(req.email)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest("username or email is required".to_string()))?;

    let (user, pair) = user_service(&state).login(&identifier, &req.password).await?;

    let jar = set_credential_cookies(jar, &pair, state.config.auth.secure_cookies);

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/api/v1/users/login", "200"])
        .inc();

    Ok((
        jar,
        ApiResponse::ok(
            AuthPayload {
                user,
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "logged in successfully",
        ),
    ))
}

/// Log out: clear the stored refresh token and both cookies
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<serde_json::Value>), AppError> {
    user_service(&state).logout(&user.id).await?;

    Ok((
        clear_credential_cookies(jar),
        ApiResponse::ok(serde_json::json!({}), "logged out successfully"),
    ))
}

/// Exchange a refresh token for a fresh credential pair
///
/// The token is taken from the `refresh_token` cookie or, for
/// non-browser clients, from the request body.
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<axum::Json<RefreshRequest>>,
) -> Result<(CookieJar, ApiResponse<TokenPayload>), AppError> {
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .or_else(|| body.and_then(|axum::Json(req)| req.refresh_token))
        .ok_or_else(|| AppError::Unauthorized("missing refresh token".to_string()))?;

    let pair = user_service(&state).refresh_session(&presented).await?;

    let jar = set_credential_cookies(jar, &pair, state.config.auth.secure_cookies);

    Ok((
        jar,
        ApiResponse::ok(
            TokenPayload {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "session refreshed",
        ),
    ))
}

/// The authenticated user's own public projection
pub async fn current_user(
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<PublicUser>, AppError> {
    Ok(ApiResponse::ok(user, "current user fetched"))
}

/// Change the current user's password
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    axum::Json(req): axum::Json<ChangePasswordRequest>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    user_service(&state)
        .change_password(&user.id, &req.old_password, &req.new_password)
        .await?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "password changed successfully",
    ))
}

/// Patch the current user's display name and/or email
pub async fn update_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    axum::Json(req): axum::Json<UpdateAccountRequest>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    if req.full_name.is_none() && req.email.is_none() {
        return Err(AppError::BadRequest(
            "at least one of fullName or email is required".to_string(),
        ));
    }

    state
        .db
        .update_account(&user.id, req.full_name.as_deref(), req.email.as_deref())
        .await?;

    let updated = state
        .db
        .get_public_user(&user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

    Ok(ApiResponse::ok(updated, "account updated successfully"))
}

/// Replace the current user's avatar (multipart `avatar` file)
pub async fn update_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let file = single_file(multipart, "avatar").await?;
    let updated = user_service(&state)
        .update_avatar(&user.id, file.path(), &file.content_type)
        .await?;

    Ok(ApiResponse::ok(updated, "avatar updated successfully"))
}

/// Replace the current user's cover image (multipart `coverImage` file)
pub async fn update_cover_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let file = single_file(multipart, "coverImage").await?;
    let updated = user_service(&state)
        .update_cover_image(&user.id, file.path(), &file.content_type)
        .await?;

    Ok(ApiResponse::ok(updated, "cover image updated successfully"))
}

/// Channel profile by username, from the viewer's perspective
pub async fn channel_profile(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(username): Path<String>,
) -> Result<ApiResponse<ChannelProfile>, AppError> {
    let profile = state
        .db
        .channel_profile(&username, viewer.as_ref().map(|v| &v.id))
        .await?
        .ok_or_else(|| AppError::NotFound("channel does not exist".to_string()))?;

    Ok(ApiResponse::ok(profile, "channel profile fetched"))
}

/// The viewer's watch history, most recently watched first
pub async fn watch_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<Vec<VideoWithOwner>>, AppError> {
    let history = state.db.watch_history(&user.id).await?;
    Ok(ApiResponse::ok(history, "watch history fetched"))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))
}

/// Extract exactly one named file field from a multipart body
async fn single_file(mut multipart: Multipart, name: &str) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some(name) {
            return spool_field(field).await;
        }
    }

    Err(AppError::BadRequest(format!("{name} file is required")))
}
