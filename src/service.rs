//! The ownership-filtered task service.
//!
//! Handlers call into [`TaskService`] with the caller's verified [`UserId`]
//! and the raw request body. The service validates the body, forwards to the
//! injected [`TaskStore`], and logs the outcome. No method can be called
//! without an owner, and the owner never comes from request data.

use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::UserId;
use crate::models::{
    CreateTask, NewTask, ReplaceTask, Task, TaskChanges, TaskReplacement, UpdateTask,
    ValidationError,
};
use crate::store::{StoreError, TaskStore};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, owner: &UserId, input: CreateTask) -> Result<Task, TaskError> {
        let new_task = NewTask::try_from(input)?;
        let task = self
            .store
            .create(owner, new_task)
            .await
            .map_err(|e| log_failure("create", owner, None, e))?;
        log::info!("Task created: task_id={}, user_id={}", task.id, owner);
        Ok(task)
    }

    pub async fn list(&self, owner: &UserId) -> Result<Vec<Task>, TaskError> {
        let tasks = self
            .store
            .list(owner)
            .await
            .map_err(|e| log_failure("list", owner, None, e))?;
        log::info!("Retrieved {} tasks for user_id={}", tasks.len(), owner);
        Ok(tasks)
    }

    pub async fn get(&self, owner: &UserId, id: Uuid) -> Result<Task, TaskError> {
        self.store
            .get(owner, id)
            .await
            .map_err(|e| log_failure("get", owner, Some(id), e).into())
    }

    pub async fn replace(
        &self,
        owner: &UserId,
        id: Uuid,
        input: ReplaceTask,
    ) -> Result<Task, TaskError> {
        let replacement = TaskReplacement::try_from(input)?;
        let task = self
            .store
            .replace(owner, id, replacement)
            .await
            .map_err(|e| log_failure("replace", owner, Some(id), e))?;
        log::info!("Task replaced: task_id={}, user_id={}", id, owner);
        Ok(task)
    }

    pub async fn update(
        &self,
        owner: &UserId,
        id: Uuid,
        input: UpdateTask,
    ) -> Result<Task, TaskError> {
        let changes = TaskChanges::try_from(input)?;
        let task = self
            .store
            .update(owner, id, changes)
            .await
            .map_err(|e| log_failure("update", owner, Some(id), e))?;
        log::info!("Task updated: task_id={}, user_id={}", id, owner);
        Ok(task)
    }

    pub async fn delete(&self, owner: &UserId, id: Uuid) -> Result<(), TaskError> {
        self.store
            .delete(owner, id)
            .await
            .map_err(|e| log_failure("delete", owner, Some(id), e))?;
        log::info!("Task deleted: task_id={}, user_id={}", id, owner);
        Ok(())
    }
}

fn log_failure(op: &str, owner: &UserId, id: Option<Uuid>, err: StoreError) -> StoreError {
    let task = id.map(|id| id.to_string()).unwrap_or_else(|| "-".into());
    match &err {
        StoreError::NotFound => {
            log::warn!("{} failed: task_id={} not found for user_id={}", op, task, owner)
        }
        other => log::error!(
            "{} failed: task_id={}, user_id={}: {}",
            op,
            task,
            owner,
            other
        ),
    }
    err
}
