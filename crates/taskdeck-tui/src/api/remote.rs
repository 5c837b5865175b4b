use async_trait::async_trait;
use taskdeck_shared::{
    api::{TaskQuery, TaskUpdate},
    Task, User,
};

use super::ApiError;

/// The remote users/tasks collections. `ApiClient` talks HTTP; tests swap in
/// an in-memory implementation.
#[async_trait]
pub trait TaskDeckApi: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;

    async fn create_user(&self, user: &User) -> Result<User, ApiError>;

    async fn delete_user(&self, id: &str) -> Result<(), ApiError>;

    /// A "not found" answer is an empty page, not an error.
    async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, ApiError>;

    async fn create_task(&self, task: &Task) -> Result<Task, ApiError>;

    async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<Task, ApiError>;

    async fn delete_task(&self, id: &str) -> Result<(), ApiError>;
}
