//! In-process transport over a task repository

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};

use super::TodoTransport;
use crate::task::{NewTask, Task, TaskPatch, TaskRepository};
use crate::{Error, Result};

/// Calls the repository directly, the way a server action would
pub struct RepositoryTransport<R> {
    repo: Arc<R>,
}

impl<R: TaskRepository> RepositoryTransport<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R: TaskRepository + 'static> TodoTransport for RepositoryTransport<R> {
    async fn list(&self) -> Result<Vec<Task>> {
        self.repo.list().await
    }

    async fn create(&self, new: NewTask) -> Result<Task> {
        self.repo.create(new).await.map_err(|e| {
            error!("Failed to create todo: {}", e);
            Error::Storage("Failed to create todo".to_string())
        })
    }

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        self.repo.update(id, patch).await.map_err(|e| match e {
            Error::TaskNotFound(id) => Error::TaskNotFound(id),
            other => {
                error!("Failed to update todo {}: {}", id, other);
                Error::Storage("Failed to update todo".to_string())
            }
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let existed = self.repo.delete(id).await.map_err(|e| {
            error!("Failed to delete todo {}: {}", id, e);
            Error::Storage("Failed to delete todo".to_string())
        })?;
        if !existed {
            debug!("Delete of absent todo {} treated as success", id);
        }
        Ok(())
    }
}
