// server/src/web/extractors.rs

use crate::errors::AppError;
use crate::state::AppState;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::warn;
use uuid::Uuid;

/// The caller, resolved from `Authorization: Bearer <token>` through the configured
/// `IdentityResolver`.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let token = bearer_token(req);
    let state = req.app_data::<web::Data<AppState>>().cloned();

    Box::pin(async move {
      let token = token?;
      let state = state.ok_or_else(|| AppError::Internal("Application state is not configured".to_string()))?;
      let user_id = state.identity.resolve(&token).await?;
      Ok(AuthenticatedUser { user_id })
    })
  }
}

fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
  let header = req
    .headers()
    .get(AUTHORIZATION)
    .ok_or_else(|| AppError::Unauthenticated("Missing Authorization header".to_string()))?;
  let value = header
    .to_str()
    .map_err(|_| AppError::Unauthenticated("Malformed Authorization header".to_string()))?;

  let (scheme, token) = value.trim().split_once(' ').unwrap_or((value.trim(), ""));
  if !scheme.eq_ignore_ascii_case("bearer") {
    warn!("Authorization header with unsupported scheme.");
    return Err(AppError::Unauthenticated("Expected a Bearer token".to_string()));
  }
  let token = token.trim();
  if token.is_empty() {
    return Err(AppError::Unauthenticated("Empty bearer token".to_string()));
  }
  Ok(token.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::test::TestRequest;

  #[test]
  fn bearer_token_parsing() {
    let req = TestRequest::default()
      .insert_header((AUTHORIZATION, "Bearer abc123"))
      .to_http_request();
    assert_eq!(bearer_token(&req).unwrap(), "abc123");

    let req = TestRequest::default()
      .insert_header((AUTHORIZATION, "bearer   spaced  "))
      .to_http_request();
    assert_eq!(bearer_token(&req).unwrap(), "spaced");

    let req = TestRequest::default()
      .insert_header((AUTHORIZATION, "Basic dXNlcjpwYXNz"))
      .to_http_request();
    assert!(matches!(bearer_token(&req), Err(AppError::Unauthenticated(_))));

    let req = TestRequest::default().insert_header((AUTHORIZATION, "Bearer")).to_http_request();
    assert!(matches!(bearer_token(&req), Err(AppError::Unauthenticated(_))));

    let req = TestRequest::default().to_http_request();
    assert!(matches!(bearer_token(&req), Err(AppError::Unauthenticated(_))));
  }
}
