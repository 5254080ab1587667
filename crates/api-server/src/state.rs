//! Application state

use std::path::PathBuf;
use std::sync::Arc;

use todo_core::task::FileTaskStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    task_store: Arc<FileTaskStore>,
}

impl AppState {
    /// Open the task store at the given path
    pub async fn new(tasks_path: PathBuf) -> todo_core::Result<Self> {
        let task_store = FileTaskStore::new(tasks_path).await?;
        Ok(Self::from_store(Arc::new(task_store)))
    }

    pub fn from_store(task_store: Arc<FileTaskStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { task_store }),
        }
    }

    /// Get reference to the task store
    pub fn task_store(&self) -> &FileTaskStore {
        &self.inner.task_store
    }
}
