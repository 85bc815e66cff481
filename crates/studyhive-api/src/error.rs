//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use studyhive_core::store::{ErrorKind, StoreError};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Rejected input, missing references and uniqueness conflicts keep their
  /// own status; anything else is a 500.
  pub fn store<E: StoreError>(err: E) -> Self {
    match err.kind() {
      ErrorKind::Invalid => Self::BadRequest(err.to_string()),
      ErrorKind::NotFound => Self::NotFound(err.to_string()),
      ErrorKind::Conflict => Self::Conflict(err.to_string()),
      ErrorKind::Internal => {
        tracing::error!(error = %err, "store operation failed");
        Self::Store(Box::new(err))
      }
    }
  }
}

/// Validation failures from the domain types are the caller's fault.
impl From<studyhive_core::Error> for ApiError {
  fn from(err: studyhive_core::Error) -> Self { Self::BadRequest(err.to_string()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
