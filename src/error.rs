use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

pub const MISSING_FIELDS: &str = "Some of the required fields are missing";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Some of the required fields are missing")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("UNAUTHORIZED")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn room_not_found(id: i32) -> Self {
        AppError::NotFound(format!("Room {} not found", id))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Validation(errors) => json!({
                "success": false,
                "error": MISSING_FIELDS,
                "fields": errors,
            }),
            // Детали ошибок БД наружу не отдаём
            AppError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                json!({ "success": false, "error": "Database error" })
            }
            AppError::Internal(message) => {
                tracing::error!("internal error: {}", message);
                json!({ "success": false, "error": "Internal error" })
            }
            other => json!({ "success": false, "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
