//! HTTP client for the task store API

use crate::error::{ClientError, Result};
use crate::types::*;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// HTTP client for the task store
///
/// # Example
///
/// ```rust,no_run
/// use tiergate_client::{TaskCreate, TaskStoreClient, TaskStoreConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TaskStoreClient::new(TaskStoreConfig {
///     base_url: "http://localhost:8000".into(),
///     ..Default::default()
/// })?;
///
/// let task = client
///     .create_task(&TaskCreate {
///         title: "Buy milk".into(),
///         description: "Oat, two cartons".into(),
///     })
///     .await?;
/// client.delete_task(task.id).await?;
/// # Ok(())
/// # }
/// ```
pub struct TaskStoreClient {
    config: TaskStoreConfig,
    client: Client,
}

impl TaskStoreClient {
    /// Create a new task store client
    pub fn new(config: TaskStoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// List all tasks
    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        let url = format!("{}/tasks", self.config.base_url);

        let response = self.client.get(&url).send().await?;
        handle_response(response).await
    }

    /// Create a task
    pub async fn create_task(&self, input: &TaskCreate) -> Result<Task> {
        let url = format!("{}/tasks", self.config.base_url);

        let response = self.client.post(&url).json(input).send().await?;
        handle_response(response).await
    }

    /// Apply a partial update to a task
    pub async fn update_task(&self, id: u64, update: &TaskUpdate) -> Result<Task> {
        let url = format!("{}/tasks/{}", self.config.base_url, id);

        let response = self.client.put(&url).json(update).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(format!("task {}", id)));
        }
        handle_response(response).await
    }

    /// Delete a task
    pub async fn delete_task(&self, id: u64) -> Result<()> {
        let url = format!("{}/tasks/{}", self.config.base_url, id);

        let response = self.client.delete(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(format!("task {}", id)));
        }
        let _: DeleteResponse = handle_response(response).await?;
        Ok(())
    }
}

/// Map a response to `T`, turning non-success statuses into errors.
pub(crate) async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T> {
    if response.status() == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound("Resource not found".to_string()));
    }

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Server {
            status,
            message: body,
        });
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
