// server/src/services/identity.rs

//! Maps a bearer credential to the caller's user id.

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

#[async_trait]
pub trait IdentityResolver: Send + Sync {
  /// Fails with `Unauthenticated` for unknown or expired credentials.
  async fn resolve(&self, token: &str) -> Result<Uuid>;
}

/// Looks tokens up in `user_sessions`, ignoring expired sessions.
pub struct SessionTableResolver {
  pool: PgPool,
}

impl SessionTableResolver {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl IdentityResolver for SessionTableResolver {
  #[instrument(name = "identity::session_lookup", skip_all, err(Display))]
  async fn resolve(&self, token: &str) -> Result<Uuid> {
    let user_id = sqlx::query_scalar::<_, Uuid>(
      "SELECT user_id FROM user_sessions WHERE token = $1 AND expires_at > now()",
    )
    .bind(token)
    .fetch_optional(&self.pool)
    .await?;

    match user_id {
      Some(user_id) => {
        debug!(%user_id, "Session resolved.");
        Ok(user_id)
      }
      None => Err(AppError::Unauthenticated("Invalid or expired token".to_string())),
    }
  }
}

/// Fixed token table, configured through `AUTH_STATIC_TOKENS`.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenResolver {
  tokens: HashMap<String, Uuid>,
}

impl StaticTokenResolver {
  pub fn new(tokens: HashMap<String, Uuid>) -> Self {
    Self { tokens }
  }

  pub fn with_token(mut self, token: impl Into<String>, user_id: Uuid) -> Self {
    self.tokens.insert(token.into(), user_id);
    self
  }
}

#[async_trait]
impl IdentityResolver for StaticTokenResolver {
  async fn resolve(&self, token: &str) -> Result<Uuid> {
    self
      .tokens
      .get(token)
      .copied()
      .ok_or_else(|| AppError::Unauthenticated("Invalid or expired token".to_string()))
  }
}
