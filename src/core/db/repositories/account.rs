//! Account repository
//!
//! Storage contract for registered accounts plus its PostgreSQL implementation.
//! Password hashing happens above this layer; repositories only persist the
//! encoded hash they are given.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::Account;

/// Account repository error types
#[derive(Debug, thiserror::Error)]
pub enum AccountRepositoryError {
    #[error("Account not found")]
    NotFound,

    #[error("Account name already exists")]
    NameAlreadyExists,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Persistence contract for accounts
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account; fails with `NameAlreadyExists` on a duplicate name
    async fn create(&self, account: &Account) -> Result<(), AccountRepositoryError>;

    async fn read_by_id(&self, id: Uuid) -> Result<Account, AccountRepositoryError>;

    async fn read_by_name(&self, name: &str) -> Result<Account, AccountRepositoryError>;

    /// Overwrite name, password hash and `updated_at` of an existing account
    async fn update(&self, account: &Account) -> Result<(), AccountRepositoryError>;

    /// Returns `true` when a record was removed
    async fn delete(&self, id: Uuid) -> Result<bool, AccountRepositoryError>;
}

fn map_unique_violation(err: sqlx::Error) -> AccountRepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AccountRepositoryError::NameAlreadyExists
        }
        _ => AccountRepositoryError::DatabaseError(err),
    }
}

/// PostgreSQL-backed account repository
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    /// Create a new account repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn create(&self, account: &Account) -> Result<(), AccountRepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.password_hash)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(())
    }

    async fn read_by_id(&self, id: Uuid) -> Result<Account, AccountRepositoryError> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, password_hash, created_at, updated_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AccountRepositoryError::NotFound)
    }

    async fn read_by_name(&self, name: &str) -> Result<Account, AccountRepositoryError> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, password_hash, created_at, updated_at
            FROM accounts
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AccountRepositoryError::NotFound)
    }

    async fn update(&self, account: &Account) -> Result<(), AccountRepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET name = $2, password_hash = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.password_hash)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        if result.rows_affected() == 0 {
            return Err(AccountRepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AccountRepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
