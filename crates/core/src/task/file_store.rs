//! File-based task storage implementation
//!
//! Stores tasks as a JSON document collection in a file on disk.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;

use super::model::{NewTask, Priority, Task, TaskPatch};
use super::repository::TaskRepository;
use crate::{Error, Result};

/// File-based task store using JSON
pub struct FileTaskStore {
    /// Path to the JSON file
    path: PathBuf,
    /// In-memory cache of tasks
    cache: RwLock<HashMap<String, Task>>,
}

impl FileTaskStore {
    /// Create a new FileTaskStore
    ///
    /// If the file doesn't exist, it will be created on first write.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            let tasks: Vec<Task> = serde_json::from_str(&content)?;
            tasks.into_iter().map(|t| (t.id.clone(), t)).collect()
        } else {
            HashMap::new()
        };

        debug!("Opened task store at {:?} ({} tasks)", path, cache.len());

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    /// Write `tasks` to disk.
    ///
    /// Callers hold the cache write guard for the whole call, so writes reach
    /// the file one at a time and in the order they were applied.
    async fn persist(&self, tasks: &HashMap<String, Task>) -> Result<()> {
        let ordered = newest_first(tasks.values().cloned().collect());
        let content = serde_json::to_string_pretty(&ordered)?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, content).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn newest_first(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    tasks
}

#[async_trait]
impl TaskRepository for FileTaskStore {
    async fn create(&self, new: NewTask) -> Result<Task> {
        if new.title.trim().is_empty() {
            return Err(Error::InvalidInput("Title cannot be empty".to_string()));
        }

        let task = Task::create(new);
        let mut cache = self.cache.write().await;
        if cache.contains_key(&task.id) {
            return Err(Error::InvalidInput(format!(
                "Task with ID {} already exists",
                task.id
            )));
        }

        let mut next = (*cache).clone();
        next.insert(task.id.clone(), task.clone());
        self.persist(&next).await?;
        *cache = next;
        Ok(task)
    }

    async fn get(&self, id: &str) -> Result<Option<Task>> {
        let cache = self.cache.read().await;
        Ok(cache.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let cache = self.cache.read().await;
        Ok(newest_first(cache.values().cloned().collect()))
    }

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        if patch.has_blank_title() {
            return Err(Error::InvalidInput("Title cannot be empty".to_string()));
        }

        let mut cache = self.cache.write().await;
        let mut updated = cache
            .get(id)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        updated.apply(&patch);
        updated.updated_at = Utc::now().max(updated.created_at);

        let mut next = (*cache).clone();
        next.insert(updated.id.clone(), updated.clone());
        self.persist(&next).await?;
        *cache = next;
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut cache = self.cache.write().await;
        if !cache.contains_key(id) {
            return Ok(false);
        }

        let mut next = (*cache).clone();
        next.remove(id);
        self.persist(&next).await?;
        *cache = next;
        Ok(true)
    }

    async fn find_by_priority(&self, priority: Priority) -> Result<Vec<Task>> {
        let cache = self.cache.read().await;
        let tasks = cache
            .values()
            .filter(|t| t.priority == priority)
            .cloned()
            .collect();
        Ok(newest_first(tasks))
    }
}
