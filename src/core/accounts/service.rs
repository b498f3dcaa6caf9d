//! Account service
//!
//! Registration, profile reads and updates, and account deletion. Deleting an
//! account also removes every task and session it owns.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::core::auth::password::{HashError, PasswordHasher};
use crate::core::db::models::Account;
use crate::core::db::repositories::{
    AccountRepository, AccountRepositoryError, SessionRepository, SessionRepositoryError,
    TaskRepository, TaskRepositoryError,
};
use crate::core::validation::{ValidationError, validate_account_name, validate_password};

/// Account service error types
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("user doesn't exists")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AccountRepositoryError> for AccountError {
    fn from(err: AccountRepositoryError) -> Self {
        match err {
            AccountRepositoryError::NotFound => AccountError::NotFound,
            AccountRepositoryError::NameAlreadyExists => {
                AccountError::Validation(ValidationError::NameTaken)
            }
            AccountRepositoryError::DatabaseError(_) => AccountError::Internal(err.to_string()),
        }
    }
}

impl From<TaskRepositoryError> for AccountError {
    fn from(err: TaskRepositoryError) -> Self {
        AccountError::Internal(err.to_string())
    }
}

impl From<SessionRepositoryError> for AccountError {
    fn from(err: SessionRepositoryError) -> Self {
        AccountError::Internal(err.to_string())
    }
}

impl From<HashError> for AccountError {
    fn from(err: HashError) -> Self {
        AccountError::Internal(err.to_string())
    }
}

/// Account service
#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    tasks: Arc<dyn TaskRepository>,
    sessions: Arc<dyn SessionRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        tasks: Arc<dyn TaskRepository>,
        sessions: Arc<dyn SessionRepository>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            accounts,
            tasks,
            sessions,
            hasher,
        }
    }

    /// Fail with `NameTaken` when `name` belongs to an account other than `owner`
    async fn ensure_name_available(
        &self,
        name: &str,
        owner: Option<Uuid>,
    ) -> Result<(), AccountError> {
        match self.accounts.read_by_name(name).await {
            Ok(existing) if Some(existing.id) == owner => Ok(()),
            Ok(_) => Err(ValidationError::NameTaken.into()),
            Err(AccountRepositoryError::NotFound) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Register a new account
    pub async fn create(&self, name: &str, password: &str) -> Result<Account, AccountError> {
        validate_account_name(name)?;
        self.ensure_name_available(name, None).await?;
        validate_password(password)?;

        let account = Account::new(name, self.hasher.hash(password)?);
        self.accounts.create(&account).await?;

        tracing::info!(account_id = %account.id, name = %account.name, "Account created");
        Ok(account)
    }

    pub async fn read(&self, id: Uuid) -> Result<Account, AccountError> {
        Ok(self.accounts.read_by_id(id).await?)
    }

    /// Replace name and password; the account may keep its current name
    pub async fn update(
        &self,
        id: Uuid,
        name: &str,
        password: &str,
    ) -> Result<Account, AccountError> {
        validate_account_name(name)?;
        self.ensure_name_available(name, Some(id)).await?;
        validate_password(password)?;

        let mut account = self.accounts.read_by_id(id).await?;
        account.name = name.to_string();
        account.password_hash = self.hasher.hash(password)?;
        account.updated_at = Utc::now();

        self.accounts.update(&account).await?;

        tracing::info!(account_id = %account.id, "Account updated");
        Ok(account)
    }

    /// Delete the account with all of its tasks and sessions
    pub async fn delete(&self, id: Uuid) -> Result<(), AccountError> {
        if !self.accounts.delete(id).await? {
            return Err(AccountError::NotFound);
        }

        let tasks = self.tasks.read_all_by_owner(id).await?;
        for task in &tasks {
            self.tasks.delete(task.id).await?;
        }

        let sessions = self.sessions.read_all_by_owner(id).await?;
        for session in &sessions {
            self.sessions.delete(session.id).await?;
        }

        tracing::info!(
            account_id = %id,
            tasks = tasks.len(),
            sessions = sessions.len(),
            "Account deleted"
        );
        Ok(())
    }
}
