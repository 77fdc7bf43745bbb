// server/src/services/mod.rs

//! Operations behind the HTTP handlers. Each one runs inside a single store transaction and
//! under the configured request deadline.

pub mod cart_service;
pub mod checkout_service;
pub mod identity;
pub mod order_service;

use crate::errors::{AppError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Awaits `operation` for at most `deadline`. On expiry the future is dropped, and with it any
/// transaction it owns, so nothing it wrote is committed.
pub(crate) async fn with_deadline<F, T>(deadline: Duration, operation: &'static str, fut: F) -> Result<T>
where
  F: Future<Output = Result<T>>,
{
  match tokio::time::timeout(deadline, fut).await {
    Ok(result) => result,
    Err(_) => {
      warn!(operation, timeout_ms = deadline.as_millis() as u64, "Store operation timed out, rolled back.");
      Err(AppError::StoreFailure(format!("{} timed out", operation)))
    }
  }
}
