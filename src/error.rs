use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::models::OrderStatus;

/// Request-level failure taxonomy. Every handler maps its failures into one
/// of these variants; nothing propagates to the caller unhandled.
///
/// Missing, invalid, and expired credentials all collapse into
/// `Unauthenticated` so responses never reveal why verification failed.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("User already exists.")]
    DuplicateEmail,

    #[error("Cannot cancel order that is {0}")]
    TerminalOrder(OrderStatus),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Internal error")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            // An illegal transition is a conflict in the taxonomy but is
            // reported as 400, matching the public contract.
            AppError::Validation(_) | AppError::TerminalOrder(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal detail is logged, never exposed.
        let message = match &self {
            AppError::Internal(source) => {
                error!(%source, "internal failure");
                "Internal error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Internal(Box::new(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(Box::new(err))
    }
}
