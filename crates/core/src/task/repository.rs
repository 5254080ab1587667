//! Task repository trait
//!
//! Defines the interface for task storage operations.

use async_trait::async_trait;

use super::model::{NewTask, Priority, Task, TaskPatch};
use crate::Result;

/// Repository interface for task CRUD operations
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Create a new task; the store assigns id and timestamps
    async fn create(&self, new: NewTask) -> Result<Task>;

    /// Get a task by ID
    async fn get(&self, id: &str) -> Result<Option<Task>>;

    /// Get all tasks, newest first
    async fn list(&self) -> Result<Vec<Task>>;

    /// Apply a partial update and return the stored task
    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task>;

    /// Delete a task by ID, returning whether it existed
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Find tasks with the given priority, newest first
    async fn find_by_priority(&self, priority: Priority) -> Result<Vec<Task>>;
}
