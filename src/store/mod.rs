//! Owner-scoped persistence for tasks.
//!
//! [`TaskStore`] is the data-access boundary. Every method takes the owner's
//! [`UserId`] and backends apply it together with any id predicate in a single
//! statement (or a single critical section), never as a check after fetching.
//! A task that exists but belongs to someone else is therefore reported exactly
//! like one that does not exist: [`StoreError::NotFound`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::UserId;
use crate::models::{NewTask, Task, TaskChanges, TaskReplacement};

pub use memory::MemoryTaskStore;
pub use postgres::PgTaskStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No task with that id is owned by the caller.
    #[error("task not found")]
    NotFound,
    /// The operation did not finish within its time bound.
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persists a new task owned by `owner`.
    async fn create(&self, owner: &UserId, task: NewTask) -> Result<Task, StoreError>;

    /// All of `owner`'s tasks, newest first.
    async fn list(&self, owner: &UserId) -> Result<Vec<Task>, StoreError>;

    async fn get(&self, owner: &UserId, id: Uuid) -> Result<Task, StoreError>;

    async fn replace(
        &self,
        owner: &UserId,
        id: Uuid,
        replacement: TaskReplacement,
    ) -> Result<Task, StoreError>;

    async fn update(
        &self,
        owner: &UserId,
        id: Uuid,
        changes: TaskChanges,
    ) -> Result<Task, StoreError>;

    async fn delete(&self, owner: &UserId, id: Uuid) -> Result<(), StoreError>;
}
