use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskdeck_shared::{
    api::{SortOrder, TaskUpdate},
    new_id, Task,
};

use crate::error::AppError;
use crate::store::{MockState, OrderField, TaskFilter};

/// Raw query string. Every value stays a string so that empty parameters
/// (`done=`) mean "no filter" instead of a parse failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub order_by: Option<String>,
    pub order: Option<String>,
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub done: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_number(name: &str, value: Option<String>) -> Result<Option<usize>, AppError> {
    non_empty(value)
        .map(|v| {
            v.parse::<usize>()
                .map_err(|_| AppError::Validation(format!("{} must be a number", name)))
        })
        .transpose()
}

impl TaskListQuery {
    pub fn into_filter(self) -> Result<TaskFilter, AppError> {
        let done = match non_empty(self.done).as_deref() {
            None => None,
            Some("true") => Some(true),
            Some("false") => Some(false),
            Some(_) => return Err(AppError::Validation("done must be true or false".into())),
        };

        let order = match non_empty(self.order).as_deref() {
            Some("asc") | Some("ASC") => SortOrder::Asc,
            _ => SortOrder::Desc,
        };

        let order_by = non_empty(self.order_by)
            .and_then(|v| OrderField::parse(&v))
            .unwrap_or_default();

        Ok(TaskFilter {
            user_id: non_empty(self.user_id),
            title: non_empty(self.title),
            done,
            order_by,
            order,
            page: parse_number("page", self.page)?,
            limit: parse_number("limit", self.limit)?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskBody {
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub user_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub user_name: Option<String>,
}

/// GET /tasks
pub async fn list_tasks(
    State(state): State<MockState>,
    Query(params): Query<TaskListQuery>,
) -> Result<Json<Vec<Task>>, AppError> {
    let filter = params.into_filter()?;
    let tasks = state.list_tasks(&filter).await.ok_or(AppError::NotFound)?;
    Ok(Json(tasks))
}

/// GET /tasks/:id
pub async fn get_task(
    State(state): State<MockState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    state.find_task(&id).await.map(Json).ok_or(AppError::NotFound)
}

/// POST /tasks
pub async fn create_task(
    State(state): State<MockState>,
    Json(body): Json<CreateTaskBody>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    if state.take_failure() {
        return Err(AppError::Injected);
    }

    let task = Task {
        id: body.id.filter(|id| !id.is_empty()).unwrap_or_else(new_id),
        title: body.title,
        done: body.done,
        user_id: body.user_id,
        created_at: body.created_at.unwrap_or_else(Utc::now),
        user_name: body.user_name,
    };

    tracing::debug!(id = %task.id, user_id = %task.user_id, "task created");
    state.insert_task(task.clone()).await;

    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /tasks/:id
pub async fn update_task(
    State(state): State<MockState>,
    Path(id): Path<String>,
    Json(update): Json<TaskUpdate>,
) -> Result<Json<Task>, AppError> {
    if state.take_failure() {
        return Err(AppError::Injected);
    }

    let task = state.update_task(&id, update).await.ok_or(AppError::NotFound)?;
    Ok(Json(task))
}

/// DELETE /tasks/:id
pub async fn delete_task(
    State(state): State<MockState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    if state.take_failure() {
        return Err(AppError::Injected);
    }

    let task = state.remove_task(&id).await.ok_or(AppError::NotFound)?;
    tracing::debug!(id = %task.id, "task deleted");

    Ok(Json(task))
}
