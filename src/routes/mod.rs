//! Request handlers, grouped by surface.

pub mod auth;
pub mod orders;
pub mod payment;

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON body extractor that folds every deserialization rejection into the
/// validation taxonomy (400) instead of axum's mixed defaults. Request
/// bodies are always deserialized into an explicit schema before any field
/// is touched.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}

/// Unwraps a required request field, trimmed, rejecting absent or blank
/// values with the field's error message.
fn required(field: Option<String>, message: &str) -> Result<String, AppError> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(AppError::Validation(message.to_string())),
    }
}
