use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Injected failure")]
    Injected,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Injected => {
                tracing::warn!("answering with injected failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // MockAPI answers with a bare JSON string body
        (status, Json(self.to_string())).into_response()
    }
}
