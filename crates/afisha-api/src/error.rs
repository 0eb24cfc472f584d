//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// A store constraint rejected the submitted data; the message names
  /// the failing slug and constraint so the caller can resubmit.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error onto a response class via the core
  /// classification.
  pub fn from_store<E>(err: E) -> Self
  where
    E: Into<afisha_core::Error>,
  {
    match err.into() {
      afisha_core::Error::NotFound(slug) => {
        ApiError::NotFound(format!("event {slug} not found"))
      }
      afisha_core::Error::Validation(msg) => ApiError::BadRequest(msg),
      err @ afisha_core::Error::Constraint { .. } => {
        ApiError::Conflict(err.to_string())
      }
      err => ApiError::Store(Box::new(err)),
    }
  }
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
