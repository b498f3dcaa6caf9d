//! Task repository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::Task;

/// Task repository error types
#[derive(Debug, thiserror::Error)]
pub enum TaskRepositoryError {
    #[error("Task not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Persistence contract for tasks
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &Task) -> Result<(), TaskRepositoryError>;

    async fn read_by_id(&self, id: Uuid) -> Result<Task, TaskRepositoryError>;

    /// All tasks of one account, oldest first
    async fn read_all_by_owner(&self, owner_id: Uuid) -> Result<Vec<Task>, TaskRepositoryError>;

    async fn update(&self, task: &Task) -> Result<(), TaskRepositoryError>;

    /// Returns `true` when a record was removed
    async fn delete(&self, id: Uuid) -> Result<bool, TaskRepositoryError>;
}

/// PostgreSQL-backed task repository
#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn create(&self, task: &Task) -> Result<(), TaskRepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, owner_id, name, completed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(task.id)
        .bind(task.owner_id)
        .bind(&task.name)
        .bind(task.completed)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn read_by_id(&self, id: Uuid) -> Result<Task, TaskRepositoryError> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, owner_id, name, completed, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TaskRepositoryError::NotFound)
    }

    async fn read_all_by_owner(&self, owner_id: Uuid) -> Result<Vec<Task>, TaskRepositoryError> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, owner_id, name, completed, created_at, updated_at
            FROM tasks
            WHERE owner_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn update(&self, task: &Task) -> Result<(), TaskRepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET name = $2, completed = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(task.id)
        .bind(&task.name)
        .bind(task.completed)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TaskRepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, TaskRepositoryError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
