//! Database module for taskkeep
//!
//! Entity models, the repository traits, and their PostgreSQL and in-memory
//! implementations.

pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used items
pub use models::*;
pub use pool::{DbConfig, DbError, create_pool, create_pool_with_migrations};
pub use repositories::{
    AccountRepository, AccountRepositoryError, MemoryAccountRepository, MemorySessionRepository,
    MemoryTaskRepository, PgAccountRepository, PgSessionRepository, PgTaskRepository,
    SessionRepository, SessionRepositoryError, TaskRepository, TaskRepositoryError,
};

pub use sqlx::PgPool;
