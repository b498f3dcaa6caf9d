//! Session repository for refresh token management
//!
//! Handles storage of refresh sessions for JWT authentication.
//! Tokens are stored as SHA-256 hashes; callers look sessions up with
//! `hash_token(raw)`.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::Session;

/// Session repository error types
#[derive(Debug, thiserror::Error)]
pub enum SessionRepositoryError {
    #[error("Session not found")]
    NotFound,

    #[error("Refresh token already in use")]
    TokenAlreadyExists,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Hash a token using SHA-256
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

/// Persistence contract for refresh sessions.
///
/// Every call touches a single record; nothing here spans several sessions
/// atomically.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<(), SessionRepositoryError>;

    async fn read_by_id(&self, id: Uuid) -> Result<Session, SessionRepositoryError>;

    /// Look a session up by the SHA-256 digest of its refresh token
    async fn read_by_token(&self, token_hash: &str) -> Result<Session, SessionRepositoryError>;

    /// All sessions of one account, oldest first
    async fn read_all_by_owner(&self, owner_id: Uuid)
    -> Result<Vec<Session>, SessionRepositoryError>;

    async fn update(&self, session: &Session) -> Result<(), SessionRepositoryError>;

    /// Returns `true` when this call removed the record
    async fn delete(&self, id: Uuid) -> Result<bool, SessionRepositoryError>;
}

/// PostgreSQL-backed session repository
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, session: &Session) -> Result<(), SessionRepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, owner_id, device, token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(session.id)
        .bind(session.owner_id)
        .bind(&session.device)
        .bind(&session.token_hash)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                SessionRepositoryError::TokenAlreadyExists
            }
            _ => SessionRepositoryError::DatabaseError(err),
        })?;

        Ok(())
    }

    async fn read_by_id(&self, id: Uuid) -> Result<Session, SessionRepositoryError> {
        sqlx::query_as::<_, Session>(
            r#"
            SELECT id, owner_id, device, token_hash, expires_at, created_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(SessionRepositoryError::NotFound)
    }

    async fn read_by_token(&self, token_hash: &str) -> Result<Session, SessionRepositoryError> {
        sqlx::query_as::<_, Session>(
            r#"
            SELECT id, owner_id, device, token_hash, expires_at, created_at
            FROM sessions
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(SessionRepositoryError::NotFound)
    }

    async fn read_all_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<Session>, SessionRepositoryError> {
        let sessions = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, owner_id, device, token_hash, expires_at, created_at
            FROM sessions
            WHERE owner_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    async fn update(&self, session: &Session) -> Result<(), SessionRepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET owner_id = $2, device = $3, token_hash = $4, expires_at = $5
            WHERE id = $1
            "#,
        )
        .bind(session.id)
        .bind(session.owner_id)
        .bind(&session.device)
        .bind(&session.token_hash)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SessionRepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, SessionRepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
