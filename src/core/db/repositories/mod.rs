//! Database repositories for taskkeep
//!
//! Each entity has a storage trait with two implementations: PostgreSQL via
//! SQLx, and an in-memory DashMap store for single-process runs and tests.

pub mod account;
pub mod memory;
pub mod session;
pub mod task;

pub use account::{AccountRepository, AccountRepositoryError, PgAccountRepository};
pub use memory::{MemoryAccountRepository, MemorySessionRepository, MemoryTaskRepository};
pub use session::{PgSessionRepository, SessionRepository, SessionRepositoryError, hash_token};
pub use task::{PgTaskRepository, TaskRepository, TaskRepositoryError};
