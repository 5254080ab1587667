//! REST transport backed by reqwest

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{info, warn};

use super::TodoTransport;
use crate::task::{NewTask, Task, TaskPatch, WireTask};
use crate::{Error, Result};

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Talks to the `/api/todos` routes of the API server
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        // Local API, never route through a proxy
        let client = Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn todos_url(&self) -> String {
        format!("{}/api/todos", self.base_url)
    }

    fn todo_url(&self, id: &str) -> String {
        format!("{}/api/todos/{}", self.base_url, urlencoding::encode(id))
    }
}

async fn error_message(res: Response, fallback: &str) -> String {
    let status = res.status();
    match res.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => format!("{} ({})", fallback, status),
    }
}

async fn decode_task(res: Response) -> Result<Task> {
    res.json::<WireTask>().await?.normalize()
}

#[async_trait]
impl TodoTransport for HttpTransport {
    async fn list(&self) -> Result<Vec<Task>> {
        let res = self.client.get(self.todos_url()).send().await?;
        if !res.status().is_success() {
            return Err(Error::Transport(
                error_message(res, "Failed to fetch todos").await,
            ));
        }

        res.json::<Vec<WireTask>>()
            .await?
            .into_iter()
            .map(WireTask::normalize)
            .collect()
    }

    async fn create(&self, new: NewTask) -> Result<Task> {
        let res = self.client.post(self.todos_url()).json(&new).send().await?;
        if !res.status().is_success() {
            let message = error_message(res, "Failed to create todo").await;
            warn!("Create rejected by server: {}", message);
            return Err(Error::Transport(message));
        }

        let task = decode_task(res).await?;
        info!("Created todo {} via {}", task.id, self.base_url);
        Ok(task)
    }

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        let res = self.client.patch(self.todo_url(id)).json(&patch).send().await?;
        match res.status() {
            StatusCode::NOT_FOUND => Err(Error::TaskNotFound(id.to_string())),
            status if status.is_success() => decode_task(res).await,
            _ => Err(Error::Transport(
                error_message(res, "Failed to update todo").await,
            )),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let res = self.client.delete(self.todo_url(id)).send().await?;
        match res.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            _ => Err(Error::Transport(
                error_message(res, "Failed to delete todo").await,
            )),
        }
    }
}
