use crate::models::{Day, HabitId};
use axum::{http::StatusCode, Json};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("habit {0} not found")]
    NotFound(HabitId),

    #[error("habit {habit_id} is already completed on {day}")]
    Conflict { habit_id: HabitId, day: Day },

    #[error("{0}")]
    Invalid(String),

    #[error("failed to persist store: {0}")]
    Persist(String),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub retryable: bool,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
            retryable: false,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let (status, retryable) = match &err {
            StoreError::NotFound(_) => (StatusCode::NOT_FOUND, false),
            StoreError::Conflict { .. } => (StatusCode::CONFLICT, false),
            StoreError::Invalid(_) => (StatusCode::BAD_REQUEST, false),
            StoreError::Persist(_) => (StatusCode::SERVICE_UNAVAILABLE, true),
        };
        Self {
            status,
            message: err.to_string(),
            retryable,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({ "error": self.message, "retryable": self.retryable });
        (self.status, Json(body)).into_response()
    }
}
