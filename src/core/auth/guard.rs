//! Request authorization
//!
//! `require_auth` verifies the bearer access token and attaches a
//! [`Principal`] to the request. Handlers behind it take `Principal` as an
//! extractor argument and call [`ensure_owner`] before touching another
//! account's data.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{Extensions, HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::core::auth::service::SessionService;
use crate::core::error::ApiError;

/// Device string used when the peer address is not available
pub const UNKNOWN_DEVICE: &str = "unknown";

/// Authorization errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("you don't have access to this resource")]
    Forbidden,
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            AccessError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AccessError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        };
        ApiError::new(self.to_string(), code).into_response_with(status)
    }
}

/// Authenticated caller attached to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub account_id: Uuid,
    pub device: String,
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AccessError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AccessError::Unauthorized)
    }
}

/// Client device as seen by the server (peer IP, without port)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDevice(pub String);

impl<S> FromRequestParts<S> for ClientDevice
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientDevice(client_device(&parts.extensions)))
    }
}

/// Resolve the device identifier from the connection info, if any
pub fn client_device(extensions: &Extensions) -> String {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_DEVICE.to_string())
}

/// Extract Bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AccessError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AccessError::Unauthorized)?;

    let (scheme, token) = auth_header
        .split_once(' ')
        .ok_or(AccessError::Unauthorized)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AccessError::Unauthorized);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AccessError::Unauthorized);
    }

    Ok(token)
}

/// Middleware: reject requests without a valid access token
pub async fn require_auth(
    State(sessions): State<SessionService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AccessError> {
    let token = extract_bearer_token(request.headers())?;

    let account_id = sessions.verify_access(token).map_err(|err| {
        tracing::warn!(error = %err, "Access token rejected");
        AccessError::Unauthorized
    })?;

    let device = client_device(request.extensions());
    request.extensions_mut().insert(Principal { account_id, device });

    Ok(next.run(request).await)
}

/// Check that `principal` owns the resource owned by `owner_id`
pub fn ensure_owner(principal: &Principal, owner_id: Uuid) -> Result<(), AccessError> {
    if principal.account_id == owner_id {
        Ok(())
    } else {
        tracing::warn!(
            account_id = %principal.account_id,
            %owner_id,
            "Access to another account's resource denied"
        );
        Err(AccessError::Forbidden)
    }
}
