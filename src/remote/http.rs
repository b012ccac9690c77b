//! REST client for the remote task store.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::{HealthStatus, RemoteError, RemoteStore, RemoteTask, RemoteTaskArgs};
use crate::stats::TaskStats;

/// HTTP implementation of [`RemoteStore`].
pub struct HttpRemote {
    client: Client,
    base_url: String,
}

impl HttpRemote {
    /// Create a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    /// Returns `Network` if the HTTP client cannot be built
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    /// Send a request and check the status. Failed responses are not parsed.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, RemoteError> {
        let response = request.send().await.map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("request failed").to_string(),
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T, RemoteError> {
        self.send(request, what)
            .await?
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    fn remote_type(&self) -> &str {
        "http"
    }

    async fn health_check(&self) -> Result<HealthStatus, RemoteError> {
        self.send_json(self.request(Method::GET, "/health"), "health").await
    }

    async fn list_tasks(&self) -> Result<Vec<RemoteTask>, RemoteError> {
        let tasks: Vec<RemoteTask> = self.send_json(self.request(Method::GET, "/tasks"), "tasks").await?;
        debug!("🌐 Fetched {} remote tasks", tasks.len());
        Ok(tasks)
    }

    async fn create_task(&self, args: RemoteTaskArgs) -> Result<RemoteTask, RemoteError> {
        args.validate(true)?;
        self.send_json(self.request(Method::POST, "/tasks").json(&args), "tasks")
            .await
    }

    async fn update_task(&self, remote_id: &str, args: RemoteTaskArgs) -> Result<RemoteTask, RemoteError> {
        args.validate(false)?;
        let path = format!("/tasks/{remote_id}");
        self.send_json(self.request(Method::PUT, &path).json(&args), remote_id)
            .await
    }

    async fn delete_task(&self, remote_id: &str) -> Result<(), RemoteError> {
        let path = format!("/tasks/{remote_id}");
        self.send(self.request(Method::DELETE, &path), remote_id).await?;
        Ok(())
    }

    async fn stats(&self) -> Result<TaskStats, RemoteError> {
        self.send_json(self.request(Method::GET, "/stats"), "stats").await
    }
}
