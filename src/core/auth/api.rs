//! Session API endpoints
//!
//! - POST /api/v1/signin - Log in, receive tokens and the `session` cookie
//! - POST /api/v1/refresh - Rotate a refresh token (body or cookie)
//! - POST /api/v1/logout - Revoke the current refresh session, clear the cookie

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::post,
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::auth::guard::{ClientDevice, Principal, require_auth};
use crate::core::auth::service::{SessionError, SessionService, Tokens};
use crate::core::error::{ApiError, internal_error};

/// Name of the cookie carrying the refresh token
pub const SESSION_COOKIE: &str = "session";

/// Session API state
#[derive(Clone)]
pub struct AuthApiState {
    pub sessions: SessionService,
}

/// Convert SessionError to API response
impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            // Callers cannot tell a missing account from a bad password
            SessionError::AccountNotFound | SessionError::Credentials(_) => {
                return ApiError::new("Invalid credentials", "INVALID_CREDENTIALS")
                    .into_response_with(StatusCode::UNAUTHORIZED);
            }
            SessionError::SessionNotFound => (StatusCode::UNAUTHORIZED, "SESSION_NOT_FOUND"),
            SessionError::RefreshExpired => (StatusCode::UNAUTHORIZED, "REFRESH_EXPIRED"),
            SessionError::DeviceMismatch => (StatusCode::UNAUTHORIZED, "DEVICE_MISMATCH"),
            SessionError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            SessionError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            SessionError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            SessionError::Internal(detail) => {
                return internal_error("Session operation failed", detail);
            }
        };

        ApiError::new(self.to_string(), code).into_response_with(status)
    }
}

/// Login request data
#[derive(Debug, Clone, Deserialize)]
pub struct SigninRequest {
    pub name: String,
    pub password: String,
}

/// Refresh / logout request data; the cookie is used when absent
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Tokens returned on signin and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expire_at: DateTime<Utc>,
    pub refresh_expire_at: DateTime<Utc>,
}

impl From<Tokens> for SessionResponse {
    fn from(tokens: Tokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expire_at: tokens.access_expires_at,
            refresh_expire_at: tokens.refresh_expires_at,
        }
    }
}

/// Response for logout
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Create the session API router
pub fn auth_api_router(state: AuthApiState) -> Router {
    let guard = middleware::from_fn_with_state(state.sessions.clone(), require_auth);
    let state = Arc::new(state);

    let protected = Router::new()
        .route("/api/v1/logout", post(logout_handler))
        .route_layer(guard);

    Router::new()
        .route("/api/v1/signin", post(signin_handler))
        .route("/api/v1/refresh", post(refresh_handler))
        .merge(protected)
        .with_state(state)
}

/// Set-Cookie value carrying the refresh token
pub fn session_cookie(token: &str, expires_at: DateTime<Utc>) -> String {
    let max_age = (expires_at - Utc::now()).num_seconds().max(0);
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age
    )
}

/// Set-Cookie value that clears the refresh cookie
pub fn cleared_session_cookie() -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE
    )
}

/// Refresh token from the JSON body, falling back to the cookie.
///
/// An empty body is allowed; a non-empty body must be a valid request.
fn presented_refresh_token(
    jar: &CookieJar,
    body: &Bytes,
) -> Result<Option<String>, SessionError> {
    let from_body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<RefreshRequest>(body)
            .map_err(|err| SessionError::InvalidRequest(err.to_string()))?
            .refresh_token
    };

    Ok(from_body
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()))
        .filter(|token| !token.is_empty()))
}

fn with_session_cookie(tokens: Tokens) -> Response {
    let cookie = session_cookie(&tokens.refresh_token, tokens.refresh_expires_at);
    (
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse::from(tokens)),
    )
        .into_response()
}

/// POST /api/v1/signin
async fn signin_handler(
    State(state): State<Arc<AuthApiState>>,
    ClientDevice(device): ClientDevice,
    Json(request): Json<SigninRequest>,
) -> Result<Response, SessionError> {
    tracing::info!(name = %request.name, %device, "Login attempt");

    let tokens = state
        .sessions
        .create(&device, &request.name, &request.password)
        .await?;

    Ok(with_session_cookie(tokens))
}

/// POST /api/v1/refresh
async fn refresh_handler(
    State(state): State<Arc<AuthApiState>>,
    ClientDevice(device): ClientDevice,
    jar: CookieJar,
    body: Bytes,
) -> Result<Response, SessionError> {
    tracing::debug!(%device, "Token refresh request");

    let token = presented_refresh_token(&jar, &body)?.ok_or(SessionError::SessionNotFound)?;
    let tokens = state.sessions.refresh(&device, &token).await?;

    Ok(with_session_cookie(tokens))
}

/// POST /api/v1/logout
async fn logout_handler(
    State(state): State<Arc<AuthApiState>>,
    principal: Principal,
    jar: CookieJar,
    body: Bytes,
) -> Result<Response, SessionError> {
    if let Some(token) = presented_refresh_token(&jar, &body)? {
        match state.sessions.revoke(principal.account_id, &token).await {
            Ok(()) | Err(SessionError::SessionNotFound) => {}
            Err(err) => return Err(err),
        }
    }

    tracing::info!(account_id = %principal.account_id, "Logged out");

    Ok((
        [(header::SET_COOKIE, cleared_session_cookie())],
        Json(LogoutResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
        .into_response())
}
