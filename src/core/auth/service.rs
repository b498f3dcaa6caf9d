//! Session lifecycle
//!
//! Login, refresh-token rotation, logout and access-token verification.
//! Coordinates the account and session repositories, the password hasher and
//! the JWT service.
//!
//! Refresh tokens are single use: a presented token's session is deleted
//! before anything else is checked, so an expired or device-mismatched
//! attempt still burns it. No lock spans the session-cap check and the
//! insert that follows, so concurrent logins of one account may briefly
//! exceed the cap.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::core::auth::jwt::{JwtError, JwtService};
use crate::core::auth::password::{HashError, PasswordHasher};
use crate::core::db::models::Session;
use crate::core::db::repositories::{
    AccountRepository, AccountRepositoryError, SessionRepository, SessionRepositoryError,
    hash_token,
};

/// Sessions an account may hold before the next login prunes them all
pub const MAX_SESSIONS_PER_ACCOUNT: usize = 10;

/// Session service error types
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("user doesn't exists")]
    AccountNotFound,

    #[error("invalid credentials: {0}")]
    Credentials(#[from] HashError),

    #[error("session doesn't exists")]
    SessionNotFound,

    #[error("refresh token expired")]
    RefreshExpired,

    #[error("device doesn't match")]
    DeviceMismatch,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("session belongs to another account")]
    Forbidden,

    #[error("invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AccountRepositoryError> for SessionError {
    fn from(err: AccountRepositoryError) -> Self {
        match err {
            AccountRepositoryError::NotFound => SessionError::AccountNotFound,
            _ => SessionError::Internal(err.to_string()),
        }
    }
}

impl From<SessionRepositoryError> for SessionError {
    fn from(err: SessionRepositoryError) -> Self {
        match err {
            SessionRepositoryError::NotFound => SessionError::SessionNotFound,
            _ => SessionError::Internal(err.to_string()),
        }
    }
}

impl From<JwtError> for SessionError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::InvalidToken => SessionError::Unauthorized,
            JwtError::EncodingError(_) => SessionError::Internal(err.to_string()),
        }
    }
}

/// Token bundle handed out on login and refresh
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Session lifecycle service
#[derive(Clone)]
pub struct SessionService {
    accounts: Arc<dyn AccountRepository>,
    sessions: Arc<dyn SessionRepository>,
    hasher: Arc<dyn PasswordHasher>,
    jwt: JwtService,
}

impl SessionService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        sessions: Arc<dyn SessionRepository>,
        hasher: Arc<dyn PasswordHasher>,
        jwt: JwtService,
    ) -> Self {
        Self {
            accounts,
            sessions,
            hasher,
            jwt,
        }
    }

    /// Log in with name and password from `device`
    pub async fn create(
        &self,
        device: &str,
        name: &str,
        password: &str,
    ) -> Result<Tokens, SessionError> {
        let account = self.accounts.read_by_name(name).await?;

        if let Err(err) = self.hasher.compare(password, &account.password_hash) {
            tracing::warn!(account_id = %account.id, %device, error = %err, "Login rejected");
            return Err(err.into());
        }

        let tokens = self.issue(account.id, device).await?;
        tracing::info!(account_id = %account.id, %device, "Session created");
        Ok(tokens)
    }

    /// Exchange a refresh token for a new bundle
    pub async fn refresh(&self, device: &str, token: &str) -> Result<Tokens, SessionError> {
        let session = self.sessions.read_by_token(&hash_token(token)).await?;

        // Only the caller that actually removed the record may continue
        if !self.sessions.delete(session.id).await? {
            return Err(SessionError::SessionNotFound);
        }

        if session.is_expired_at(Utc::now()) {
            tracing::warn!(account_id = %session.owner_id, "Expired refresh token presented");
            return Err(SessionError::RefreshExpired);
        }

        if session.device != device {
            tracing::warn!(
                account_id = %session.owner_id,
                expected = %session.device,
                actual = %device,
                "Refresh token presented from another device"
            );
            return Err(SessionError::DeviceMismatch);
        }

        let tokens = self.issue(session.owner_id, device).await?;
        tracing::info!(account_id = %session.owner_id, %device, "Session refreshed");
        Ok(tokens)
    }

    /// Delete the session behind a refresh token owned by `account_id`
    pub async fn revoke(&self, account_id: Uuid, token: &str) -> Result<(), SessionError> {
        let session = self.sessions.read_by_token(&hash_token(token)).await?;

        if session.owner_id != account_id {
            tracing::warn!(
                %account_id,
                owner_id = %session.owner_id,
                "Revocation of another account's session denied"
            );
            return Err(SessionError::Forbidden);
        }

        if !self.sessions.delete(session.id).await? {
            return Err(SessionError::SessionNotFound);
        }

        tracing::info!(account_id = %session.owner_id, "Session revoked");
        Ok(())
    }

    /// Validate an access token and return the account ID if valid
    pub fn verify_access(&self, token: &str) -> Result<Uuid, SessionError> {
        Ok(self.jwt.verify_access(token)?)
    }

    async fn issue(&self, account_id: Uuid, device: &str) -> Result<Tokens, SessionError> {
        let (access_token, access_expires_at) =
            self.jwt.generate_access(account_id, self.jwt.access_ttl())?;
        let refresh_token = self.jwt.generate_refresh();

        let now = Utc::now();
        let refresh_expires_at = now + self.jwt.refresh_ttl();

        let existing = self.sessions.read_all_by_owner(account_id).await?;
        if existing.len() >= MAX_SESSIONS_PER_ACCOUNT {
            tracing::warn!(
                %account_id,
                sessions = existing.len(),
                "Session limit reached, revoking all sessions"
            );
            for session in &existing {
                self.sessions.delete(session.id).await?;
            }
        }

        let session = Session {
            id: Uuid::new_v4(),
            owner_id: account_id,
            device: device.to_string(),
            token_hash: hash_token(&refresh_token),
            expires_at: refresh_expires_at,
            created_at: now,
        };
        self.sessions.create(&session).await?;

        Ok(Tokens {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }
}
