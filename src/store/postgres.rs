use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use super::{StoreError, TaskStore};
use crate::auth::UserId;
use crate::config::Config;
use crate::models::{NewTask, Task, TaskChanges, TaskReplacement};

const TASK_COLUMNS: &str = "id, title, description, completed, owner_id, created_at, updated_at";

/// Builds the connection pool with bounded size and acquisition time.
pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout)
        .connect(&config.database_url)
        .await
}

/// Applies the bundled migrations (`migrations/`).
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// PostgreSQL-backed task store.
///
/// Every statement touching an existing row carries both `id = $1` and
/// `owner_id = $2`, and every call is bounded by `query_timeout`.
#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgTaskStore {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(self.query_timeout)),
        }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn create(&self, owner: &UserId, task: NewTask) -> Result<Task, StoreError> {
        let task = Task::new(task, owner.clone());
        let sql = format!(
            "INSERT INTO tasks (id, title, description, completed, owner_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {TASK_COLUMNS}"
        );

        self.bounded(
            sqlx::query_as::<_, Task>(&sql)
                .bind(task.id)
                .bind(&task.title)
                .bind(&task.description)
                .bind(task.completed)
                .bind(&task.owner_id)
                .bind(task.created_at)
                .bind(task.updated_at)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn list(&self, owner: &UserId) -> Result<Vec<Task>, StoreError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = $1 ORDER BY created_at DESC"
        );

        self.bounded(
            sqlx::query_as::<_, Task>(&sql)
                .bind(owner)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn get(&self, owner: &UserId, id: Uuid) -> Result<Task, StoreError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND owner_id = $2");

        self.bounded(
            sqlx::query_as::<_, Task>(&sql)
                .bind(id)
                .bind(owner)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn replace(
        &self,
        owner: &UserId,
        id: Uuid,
        replacement: TaskReplacement,
    ) -> Result<Task, StoreError> {
        let sql = format!(
            "UPDATE tasks
             SET title = $3, description = $4, completed = $5, updated_at = $6
             WHERE id = $1 AND owner_id = $2
             RETURNING {TASK_COLUMNS}"
        );

        self.bounded(
            sqlx::query_as::<_, Task>(&sql)
                .bind(id)
                .bind(owner)
                .bind(&replacement.title)
                .bind(&replacement.description)
                .bind(replacement.completed)
                .bind(Utc::now())
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn update(
        &self,
        owner: &UserId,
        id: Uuid,
        changes: TaskChanges,
    ) -> Result<Task, StoreError> {
        // $4 says whether the description is being written at all; $5 may then be NULL to clear it.
        let sql = format!(
            "UPDATE tasks
             SET title = COALESCE($3::VARCHAR, title),
                 description = CASE WHEN $4::BOOLEAN THEN $5::VARCHAR ELSE description END,
                 completed = COALESCE($6::BOOLEAN, completed),
                 updated_at = $7
             WHERE id = $1 AND owner_id = $2
             RETURNING {TASK_COLUMNS}"
        );
        let description_present = changes.description.is_some();
        let description = changes.description.flatten();

        self.bounded(
            sqlx::query_as::<_, Task>(&sql)
                .bind(id)
                .bind(owner)
                .bind(&changes.title)
                .bind(description_present)
                .bind(&description)
                .bind(changes.completed)
                .bind(Utc::now())
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, owner: &UserId, id: Uuid) -> Result<(), StoreError> {
        let result = self
            .bounded(
                sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
                    .bind(id)
                    .bind(owner)
                    .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
