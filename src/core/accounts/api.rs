//! Account API endpoints
//!
//! - POST /api/v1/signup - Register a new account
//! - GET /api/v1/profile - Read the caller's profile
//! - POST /api/v1/profile - Change the caller's name and password
//! - POST /api/v1/delete - Delete the caller's account

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::accounts::service::{AccountError, AccountService};
use crate::core::auth::api::cleared_session_cookie;
use crate::core::auth::guard::{Principal, require_auth};
use crate::core::auth::service::SessionService;
use crate::core::db::models::AccountResponse;
use crate::core::error::{ApiError, internal_error};
use crate::core::validation::ValidationError;

/// Account API state
#[derive(Clone)]
pub struct AccountsApiState {
    pub accounts: AccountService,
    pub sessions: SessionService,
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AccountError::Validation(ValidationError::NameTaken) => {
                (StatusCode::CONFLICT, "NAME_TAKEN")
            }
            AccountError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AccountError::NotFound => (StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND"),
            AccountError::Internal(detail) => {
                return internal_error("Account operation failed", detail);
            }
        };

        ApiError::new(self.to_string(), code).into_response_with(status)
    }
}

/// Signup and profile update request data
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRequest {
    pub name: String,
    pub password: String,
}

/// Response for account deletion
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Create the account API router
pub fn accounts_api_router(state: AccountsApiState) -> Router {
    let guard = middleware::from_fn_with_state(state.sessions.clone(), require_auth);
    let state = Arc::new(state);

    let protected = Router::new()
        .route("/api/v1/profile", get(profile_handler).post(update_profile_handler))
        .route("/api/v1/delete", post(delete_handler))
        .route_layer(guard);

    Router::new()
        .route("/api/v1/signup", post(signup_handler))
        .merge(protected)
        .with_state(state)
}

/// POST /api/v1/signup
async fn signup_handler(
    State(state): State<Arc<AccountsApiState>>,
    Json(request): Json<AccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AccountError> {
    tracing::info!(name = %request.name, "Registration attempt");

    let account = state
        .accounts
        .create(&request.name, &request.password)
        .await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET /api/v1/profile
async fn profile_handler(
    State(state): State<Arc<AccountsApiState>>,
    principal: Principal,
) -> Result<Json<AccountResponse>, AccountError> {
    let account = state.accounts.read(principal.account_id).await?;
    Ok(Json(account.into()))
}

/// POST /api/v1/profile
async fn update_profile_handler(
    State(state): State<Arc<AccountsApiState>>,
    principal: Principal,
    Json(request): Json<AccountRequest>,
) -> Result<Json<AccountResponse>, AccountError> {
    let account = state
        .accounts
        .update(principal.account_id, &request.name, &request.password)
        .await?;

    Ok(Json(account.into()))
}

/// POST /api/v1/delete
async fn delete_handler(
    State(state): State<Arc<AccountsApiState>>,
    principal: Principal,
) -> Result<Response, AccountError> {
    state.accounts.delete(principal.account_id).await?;

    Ok((
        [(header::SET_COOKIE, cleared_session_cookie())],
        Json(DeleteResponse {
            message: "Account deleted".to_string(),
        }),
    )
        .into_response())
}
