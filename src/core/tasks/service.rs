//! Task service
//!
//! Task CRUD scoped to the owning account. Every operation on an existing task
//! loads it first and checks ownership against the caller's [`Principal`];
//! a task owned by someone else is reported as forbidden, never as missing.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::core::auth::guard::{Principal, ensure_owner};
use crate::core::db::models::Task;
use crate::core::db::repositories::{
    AccountRepository, AccountRepositoryError, TaskRepository, TaskRepositoryError,
};
use crate::core::validation::{ValidationError, normalize_task_name};

/// Task service error types
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("user doesn't exists")]
    AccountNotFound,

    #[error("task doesn't exists")]
    NotFound,

    #[error("you don't have authorization to view this task")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TaskRepositoryError> for TaskError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound => TaskError::NotFound,
            TaskRepositoryError::DatabaseError(_) => TaskError::Internal(err.to_string()),
        }
    }
}

impl From<AccountRepositoryError> for TaskError {
    fn from(err: AccountRepositoryError) -> Self {
        match err {
            AccountRepositoryError::NotFound => TaskError::AccountNotFound,
            _ => TaskError::Internal(err.to_string()),
        }
    }
}

/// Task service
#[derive(Clone)]
pub struct TaskService {
    accounts: Arc<dyn AccountRepository>,
    tasks: Arc<dyn TaskRepository>,
}

impl TaskService {
    pub fn new(accounts: Arc<dyn AccountRepository>, tasks: Arc<dyn TaskRepository>) -> Self {
        Self { accounts, tasks }
    }

    /// Create a task for `owner`; the owner must exist
    pub async fn create(
        &self,
        owner: Uuid,
        name: &str,
        completed: bool,
    ) -> Result<Task, TaskError> {
        let name = normalize_task_name(name)?;
        self.accounts.read_by_id(owner).await?;

        let task = Task::new(owner, name, completed);
        self.tasks.create(&task).await?;

        tracing::info!(task_id = %task.id, owner_id = %owner, "Task created");
        Ok(task)
    }

    /// Load a task the caller owns
    async fn owned(&self, principal: &Principal, id: Uuid) -> Result<Task, TaskError> {
        let task = self.tasks.read_by_id(id).await?;
        ensure_owner(principal, task.owner_id).map_err(|_| TaskError::Forbidden)?;
        Ok(task)
    }

    pub async fn read(&self, principal: &Principal, id: Uuid) -> Result<Task, TaskError> {
        let task = self.owned(principal, id).await?;
        tracing::debug!(task_id = %id, "Task read");
        Ok(task)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        name: &str,
        completed: bool,
    ) -> Result<Task, TaskError> {
        let name = normalize_task_name(name)?;
        let mut task = self.owned(principal, id).await?;

        task.name = name;
        task.completed = completed;
        task.updated_at = Utc::now();
        self.tasks.update(&task).await?;

        tracing::info!(task_id = %id, completed, "Task updated");
        Ok(task)
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), TaskError> {
        let task = self.owned(principal, id).await?;

        if !self.tasks.delete(task.id).await? {
            return Err(TaskError::NotFound);
        }

        tracing::info!(task_id = %id, "Task deleted");
        Ok(())
    }

    /// All tasks owned by `owner`, oldest first
    pub async fn list(&self, owner: Uuid) -> Result<Vec<Task>, TaskError> {
        Ok(self.tasks.read_all_by_owner(owner).await?)
    }
}
