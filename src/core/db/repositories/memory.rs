//! In-memory repositories
//!
//! DashMap-backed implementations of the repository traits. Used when no
//! `DATABASE_URL` is configured and throughout the test suite. Uniqueness of
//! account names and refresh token digests is enforced through secondary
//! indexes updated with the entry API, so two concurrent inserts cannot both
//! win.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::account::{AccountRepository, AccountRepositoryError};
use super::session::{SessionRepository, SessionRepositoryError};
use super::task::{TaskRepository, TaskRepositoryError};
use crate::core::db::models::{Account, Session, Task};

// ============================================================================
// Accounts
// ============================================================================

#[derive(Clone, Default)]
pub struct MemoryAccountRepository {
    accounts: Arc<DashMap<Uuid, Account>>,
    names: Arc<DashMap<String, Uuid>>,
}

impl MemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn create(&self, account: &Account) -> Result<(), AccountRepositoryError> {
        match self.names.entry(account.name.clone()) {
            Entry::Occupied(_) => return Err(AccountRepositoryError::NameAlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(account.id);
            }
        }
        self.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn read_by_id(&self, id: Uuid) -> Result<Account, AccountRepositoryError> {
        self.accounts
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(AccountRepositoryError::NotFound)
    }

    async fn read_by_name(&self, name: &str) -> Result<Account, AccountRepositoryError> {
        let id = self
            .names
            .get(name)
            .map(|entry| *entry.value())
            .ok_or(AccountRepositoryError::NotFound)?;
        self.read_by_id(id).await
    }

    async fn update(&self, account: &Account) -> Result<(), AccountRepositoryError> {
        let previous_name = self
            .accounts
            .get(&account.id)
            .map(|entry| entry.value().name.clone())
            .ok_or(AccountRepositoryError::NotFound)?;

        if previous_name != account.name {
            match self.names.entry(account.name.clone()) {
                Entry::Occupied(_) => return Err(AccountRepositoryError::NameAlreadyExists),
                Entry::Vacant(slot) => {
                    slot.insert(account.id);
                }
            }
            self.names.remove(&previous_name);
        }

        self.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AccountRepositoryError> {
        match self.accounts.remove(&id) {
            Some((_, account)) => {
                self.names.remove(&account.name);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ============================================================================
// Sessions
// ============================================================================

#[derive(Clone, Default)]
pub struct MemorySessionRepository {
    sessions: Arc<DashMap<Uuid, Session>>,
    tokens: Arc<DashMap<String, Uuid>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions across all accounts
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn create(&self, session: &Session) -> Result<(), SessionRepositoryError> {
        match self.tokens.entry(session.token_hash.clone()) {
            Entry::Occupied(_) => return Err(SessionRepositoryError::TokenAlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(session.id);
            }
        }
        self.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn read_by_id(&self, id: Uuid) -> Result<Session, SessionRepositoryError> {
        self.sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(SessionRepositoryError::NotFound)
    }

    async fn read_by_token(&self, token_hash: &str) -> Result<Session, SessionRepositoryError> {
        let id = self
            .tokens
            .get(token_hash)
            .map(|entry| *entry.value())
            .ok_or(SessionRepositoryError::NotFound)?;
        self.read_by_id(id).await
    }

    async fn read_all_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<Session>, SessionRepositoryError> {
        let mut sessions: Vec<Session> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().owner_id == owner_id)
            .map(|entry| entry.value().clone())
            .collect();
        sessions.sort_by_key(|session| session.created_at);
        Ok(sessions)
    }

    async fn update(&self, session: &Session) -> Result<(), SessionRepositoryError> {
        let previous_hash = self
            .sessions
            .get(&session.id)
            .map(|entry| entry.value().token_hash.clone())
            .ok_or(SessionRepositoryError::NotFound)?;

        if previous_hash != session.token_hash {
            match self.tokens.entry(session.token_hash.clone()) {
                Entry::Occupied(_) => return Err(SessionRepositoryError::TokenAlreadyExists),
                Entry::Vacant(slot) => {
                    slot.insert(session.id);
                }
            }
            self.tokens.remove(&previous_hash);
        }

        self.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, SessionRepositoryError> {
        match self.sessions.remove(&id) {
            Some((_, session)) => {
                self.tokens.remove(&session.token_hash);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ============================================================================
// Tasks
// ============================================================================

#[derive(Clone, Default)]
pub struct MemoryTaskRepository {
    tasks: Arc<DashMap<Uuid, Task>>,
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn create(&self, task: &Task) -> Result<(), TaskRepositoryError> {
        self.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn read_by_id(&self, id: Uuid) -> Result<Task, TaskRepositoryError> {
        self.tasks
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(TaskRepositoryError::NotFound)
    }

    async fn read_all_by_owner(&self, owner_id: Uuid) -> Result<Vec<Task>, TaskRepositoryError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|entry| entry.value().owner_id == owner_id)
            .map(|entry| entry.value().clone())
            .collect();
        tasks.sort_by_key(|task| task.created_at);
        Ok(tasks)
    }

    async fn update(&self, task: &Task) -> Result<(), TaskRepositoryError> {
        match self.tasks.get_mut(&task.id) {
            Some(mut entry) => {
                *entry.value_mut() = task.clone();
                Ok(())
            }
            None => Err(TaskRepositoryError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, TaskRepositoryError> {
        Ok(self.tasks.remove(&id).is_some())
    }
}
