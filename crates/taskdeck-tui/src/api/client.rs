use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use taskdeck_shared::{
    api::{TaskQuery, TaskUpdate},
    Task, User,
};

use super::remote::TaskDeckApi;

/// Remote call an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FetchUsers,
    CreateUser,
    DeleteUser,
    FetchTasks,
    CreateTask,
    UpdateTask,
    DeleteTask,
}

impl Operation {
    pub fn is_listing(&self) -> bool {
        matches!(self, Operation::FetchUsers | Operation::FetchTasks)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Operation::FetchUsers => "fetch users",
            Operation::CreateUser => "create user",
            Operation::DeleteUser => "delete user",
            Operation::FetchTasks => "fetch tasks",
            Operation::CreateTask => "create task",
            Operation::UpdateTask => "update task",
            Operation::DeleteTask => "delete task",
        };
        f.write_str(text)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Failed to {op}: server returned {status}")]
    Status {
        op: Operation,
        status: StatusCode,
        body: String,
    },
    #[error("Failed to {op}: {source}")]
    Network {
        op: Operation,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to {op}: unexpected response body: {source}")]
    Decode {
        op: Operation,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn operation(&self) -> Operation {
        match self {
            ApiError::Status { op, .. } | ApiError::Network { op, .. } | ApiError::Decode { op, .. } => *op,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    /// The remote answers 404 for a filtered listing without rows.
    EmptyListing,
    Failure,
}

pub fn classify(op: Operation, status: StatusCode) -> StatusClass {
    if status.is_success() {
        StatusClass::Success
    } else if status == StatusCode::NOT_FOUND && op.is_listing() {
        StatusClass::EmptyListing
    } else {
        StatusClass::Failure
    }
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build URL for endpoint
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn tasks_url(&self, query: &TaskQuery) -> String {
        let query_string = query
            .query_pairs()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(&value)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.url("/tasks"), query_string)
    }

    async fn send(&self, op: Operation, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        tracing::debug!(%op, "sending request");
        request.send().await.map_err(|source| {
            tracing::warn!(%op, error = %source, "request failed");
            ApiError::Network { op, source }
        })
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        op: Operation,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::Network { op, source })?;
        serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode { op, source })
    }

    async fn failure(&self, op: Operation, response: reqwest::Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%op, %status, "remote rejected request");
        ApiError::Status { op, status, body }
    }

    /// Handle API response
    async fn handle_response<T: DeserializeOwned>(
        &self,
        op: Operation,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        match classify(op, response.status()) {
            StatusClass::Success => self.decode(op, response).await,
            StatusClass::EmptyListing | StatusClass::Failure => Err(self.failure(op, response).await),
        }
    }

    /// Handle listing response, where 404 means "no rows"
    async fn handle_listing<T: DeserializeOwned>(
        &self,
        op: Operation,
        response: reqwest::Response,
    ) -> Result<Vec<T>, ApiError> {
        match classify(op, response.status()) {
            StatusClass::Success => self.decode(op, response).await,
            StatusClass::EmptyListing => {
                tracing::debug!(%op, "listing not found, treating as empty");
                Ok(Vec::new())
            }
            StatusClass::Failure => Err(self.failure(op, response).await),
        }
    }

    /// Handle empty response
    async fn handle_empty_response(
        &self,
        op: Operation,
        response: reqwest::Response,
    ) -> Result<(), ApiError> {
        match classify(op, response.status()) {
            StatusClass::Success => Ok(()),
            StatusClass::EmptyListing | StatusClass::Failure => Err(self.failure(op, response).await),
        }
    }
}

#[async_trait]
impl TaskDeckApi for ApiClient {
    // ============ Users ============

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let op = Operation::FetchUsers;
        let response = self.send(op, self.client.get(self.url("/users"))).await?;
        self.handle_listing(op, response).await
    }

    async fn create_user(&self, user: &User) -> Result<User, ApiError> {
        let op = Operation::CreateUser;
        let response = self
            .send(op, self.client.post(self.url("/users")).json(user))
            .await?;
        self.handle_response(op, response).await
    }

    async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        let op = Operation::DeleteUser;
        let url = self.url(&format!("/users/{}", urlencoding::encode(id)));
        let response = self.send(op, self.client.delete(url)).await?;
        self.handle_empty_response(op, response).await
    }

    // ============ Tasks ============

    async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, ApiError> {
        let op = Operation::FetchTasks;
        let response = self
            .send(
                op,
                self.client
                    .get(self.tasks_url(query))
                    .header("content-type", "application/json"),
            )
            .await?;
        self.handle_listing(op, response).await
    }

    async fn create_task(&self, task: &Task) -> Result<Task, ApiError> {
        let op = Operation::CreateTask;
        let response = self
            .send(op, self.client.post(self.url("/tasks")).json(task))
            .await?;
        self.handle_response(op, response).await
    }

    async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<Task, ApiError> {
        let op = Operation::UpdateTask;
        let url = self.url(&format!("/tasks/{}", urlencoding::encode(id)));
        let response = self.send(op, self.client.put(url).json(update)).await?;
        self.handle_response(op, response).await
    }

    async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        let op = Operation::DeleteTask;
        let url = self.url(&format!("/tasks/{}", urlencoding::encode(id)));
        let response = self.send(op, self.client.delete(url)).await?;
        self.handle_empty_response(op, response).await
    }
}
