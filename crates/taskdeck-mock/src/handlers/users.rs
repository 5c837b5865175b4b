use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskdeck_shared::{new_id, User};

use crate::error::AppError;
use crate::store::MockState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserBody {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub created_at: Option<DateTime<Utc>>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub city: String,
}

/// GET /users
pub async fn list_users(State(state): State<MockState>) -> Json<Vec<User>> {
    Json(state.users().await)
}

/// GET /users/:id
pub async fn get_user(
    State(state): State<MockState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    state.find_user(&id).await.map(Json).ok_or(AppError::NotFound)
}

/// POST /users
pub async fn create_user(
    State(state): State<MockState>,
    Json(body): Json<CreateUserBody>,
) -> Result<(StatusCode, Json<User>), AppError> {
    if state.take_failure() {
        return Err(AppError::Injected);
    }

    let user = User {
        id: body.id.filter(|id| !id.is_empty()).unwrap_or_else(new_id),
        name: body.name,
        email: body.email,
        created_at: body.created_at.unwrap_or_else(Utc::now),
        avatar: body.avatar,
        city: body.city,
    };

    tracing::debug!(id = %user.id, "user created");
    state.insert_user(user.clone()).await;

    Ok((StatusCode::CREATED, Json(user)))
}

/// DELETE /users/:id
pub async fn delete_user(
    State(state): State<MockState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    if state.take_failure() {
        return Err(AppError::Injected);
    }

    let user = state.remove_user(&id).await.ok_or(AppError::NotFound)?;
    tracing::debug!(id = %user.id, "user deleted");

    Ok(Json(user))
}
