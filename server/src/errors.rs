// server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use unisale_core::FlowError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Authentication required: {0}")]
  Unauthenticated(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  InvalidInput(String),

  #[error("Cart is empty")]
  EmptyCart,

  #[error("{0}")]
  Conflict(String),

  #[error("Store failure: {0}")]
  StoreFailure(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<AppError>() {
      Ok(app_err) => app_err,
      Err(err) => match err.downcast::<sqlx::Error>() {
        Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
        Err(other) => AppError::Internal(other.to_string()),
      },
    }
  }
}

impl AppError {
  /// Message safe to return to the client. Server-side failures are reduced to a generic text.
  pub fn public_message(&self) -> String {
    match self {
      AppError::Unauthenticated(_)
      | AppError::Forbidden(_)
      | AppError::NotFound(_)
      | AppError::InvalidInput(_)
      | AppError::EmptyCart
      | AppError::Conflict(_) => self.to_string(),
      AppError::StoreFailure(_) | AppError::Sqlx(_) => "Database operation failed".to_string(),
      AppError::Config(_) => "Configuration issue".to_string(),
      AppError::Workflow { .. } => "Workflow processing error".to_string(),
      AppError::Internal(_) => "An internal error occurred".to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::InvalidInput(_) | AppError::EmptyCart => StatusCode::BAD_REQUEST,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::StoreFailure(_)
      | AppError::Sqlx(_)
      | AppError::Config(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with server error");
    } else {
      tracing::info!(application_error = %self, status = status.as_u16(), "Responding with client error");
    }
    HttpResponse::build(status).json(json!({ "error": self.public_message() }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
