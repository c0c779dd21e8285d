use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, TaskStore};
use crate::auth::UserId;
use crate::models::{NewTask, Task, TaskChanges, TaskReplacement};

/// In-process task store, used by tests and for running without a database.
///
/// The owner check and the id lookup happen under the same lock acquisition,
/// mirroring the single `WHERE id = .. AND owner_id = ..` statement of the
/// Postgres store.
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned_mut<'a>(
    tasks: &'a mut HashMap<Uuid, Task>,
    owner: &UserId,
    id: Uuid,
) -> Result<&'a mut Task, StoreError> {
    tasks
        .get_mut(&id)
        .filter(|task| &task.owner_id == owner)
        .ok_or(StoreError::NotFound)
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn create(&self, owner: &UserId, task: NewTask) -> Result<Task, StoreError> {
        let task = Task::new(task, owner.clone());
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task)
    }

    async fn list(&self, owner: &UserId) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|task| &task.owner_id == owner)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn get(&self, owner: &UserId, id: Uuid) -> Result<Task, StoreError> {
        self.tasks
            .read()
            .await
            .get(&id)
            .filter(|task| &task.owner_id == owner)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn replace(
        &self,
        owner: &UserId,
        id: Uuid,
        replacement: TaskReplacement,
    ) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = owned_mut(&mut tasks, owner, id)?;
        task.apply_replacement(replacement, Utc::now());
        Ok(task.clone())
    }

    async fn update(
        &self,
        owner: &UserId,
        id: Uuid,
        changes: TaskChanges,
    ) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = owned_mut(&mut tasks, owner, id)?;
        task.apply_changes(changes, Utc::now());
        Ok(task.clone())
    }

    async fn delete(&self, owner: &UserId, id: Uuid) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        owned_mut(&mut tasks, owner, id)?;
        tasks.remove(&id);
        Ok(())
    }
}
