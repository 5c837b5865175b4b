use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use taskdeck_shared::{
    api::{TaskQuery, TaskUpdate},
    Task, User,
};

use super::{ApiError, Operation, TaskDeckApi};

/// In-memory collections plus a call log.
#[derive(Default)]
pub struct FakeApi {
    pub users: Mutex<Vec<User>>,
    pub tasks: Mutex<Vec<Task>>,
    pub calls: Mutex<Vec<Operation>>,
    failing: Mutex<Vec<Operation>>,
}

impl FakeApi {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
            ..Self::default()
        }
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            ..Self::default()
        }
    }

    /// Every later call to `op` answers 500.
    pub fn fail(&self, op: Operation) {
        self.failing.lock().unwrap().push(op);
    }

    pub fn recover(&self, op: Operation) {
        self.failing.lock().unwrap().retain(|o| *o != op);
    }

    pub fn count(&self, op: Operation) -> usize {
        self.calls.lock().unwrap().iter().filter(|o| **o == op).count()
    }

    fn enter(&self, op: Operation) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(op);
        if self.failing.lock().unwrap().contains(&op) {
            return Err(ApiError::Status {
                op,
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "\"Injected failure\"".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TaskDeckApi for FakeApi {
    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.enter(Operation::FetchUsers)?;
        Ok(self.users.lock().unwrap().clone())
    }

    async fn create_user(&self, user: &User) -> Result<User, ApiError> {
        self.enter(Operation::CreateUser)?;
        self.users.lock().unwrap().push(user.clone());
        Ok(user.clone())
    }

    async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        self.enter(Operation::DeleteUser)?;
        self.users.lock().unwrap().retain(|u| u.id != id);
        Ok(())
    }

    async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, ApiError> {
        self.enter(Operation::FetchTasks)?;
        let mut tasks: Vec<Task> = self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| query.user_id.as_ref().map_or(true, |id| &t.user_id == id))
            .filter(|t| query.title.is_empty() || t.title.contains(&query.title))
            .filter(|t| query.done.map_or(true, |done| t.done == done))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let offset = (query.page.max(1) as usize - 1) * query.limit as usize;
        Ok(tasks.into_iter().skip(offset).take(query.limit as usize).collect())
    }

    async fn create_task(&self, task: &Task) -> Result<Task, ApiError> {
        self.enter(Operation::CreateTask)?;
        self.tasks.lock().unwrap().push(task.clone());
        Ok(task.clone())
    }

    async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<Task, ApiError> {
        self.enter(Operation::UpdateTask)?;
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(ApiError::Status {
                op: Operation::UpdateTask,
                status: StatusCode::NOT_FOUND,
                body: String::new(),
            })?;
        if let Some(done) = update.done {
            task.done = done;
        }
        if let Some(title) = &update.title {
            task.title = title.clone();
        }
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        self.enter(Operation::DeleteTask)?;
        self.tasks.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }
}
