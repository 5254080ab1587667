//! Transport layer between the todo state and the store
//!
//! [`RepositoryTransport`] talks to a [`crate::task::TaskRepository`] in
//! process, [`HttpTransport`] goes through the REST API.

mod direct;
mod http;

use async_trait::async_trait;

use crate::task::{NewTask, Task, TaskPatch};
use crate::Result;

pub use direct::RepositoryTransport;
pub use http::HttpTransport;

/// Operations the todo state needs from the server side
#[async_trait]
pub trait TodoTransport: Send + Sync {
    /// Fetch every task, newest first
    async fn list(&self) -> Result<Vec<Task>>;

    /// Create a task and return the stored version
    async fn create(&self, new: NewTask) -> Result<Task>;

    /// Apply a partial update; fails with `TaskNotFound` for unknown ids
    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task>;

    /// Delete a task. Deleting an id that is already gone succeeds.
    async fn delete(&self, id: &str) -> Result<()>;
}
