// server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

impl StoreBackend {
  pub fn as_str(&self) -> &'static str {
    match self {
      StoreBackend::Postgres => "postgres",
      StoreBackend::Memory => "memory",
    }
  }
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
      "memory" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!("Invalid STORE_BACKEND '{}': expected postgres or memory", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthBackend {
  /// Bearer tokens are looked up in the `user_sessions` table.
  Sessions,
  /// Bearer tokens come from `AUTH_STATIC_TOKENS`.
  Static,
}

impl FromStr for AuthBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "sessions" => Ok(AuthBackend::Sessions),
      "static" => Ok(AuthBackend::Static),
      other => Err(AppError::Config(format!("Invalid AUTH_BACKEND '{}': expected sessions or static", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pretty" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      other => Err(AppError::Config(format!("Invalid LOG_FORMAT '{}': expected pretty or json", other))),
    }
  }
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  pub database_max_connections: u32,
  pub database_acquire_timeout: Duration,
  pub request_timeout: Duration,
  pub run_migrations: bool,
  pub auth_backend: AuthBackend,
  pub static_tokens: HashMap<String, Uuid>,
  pub log_format: LogFormat,
}

// Tokens and the connection string stay out of logs.
impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("store_backend", &self.store_backend)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .field("database_max_connections", &self.database_max_connections)
      .field("database_acquire_timeout", &self.database_acquire_timeout)
      .field("request_timeout", &self.request_timeout)
      .field("run_migrations", &self.run_migrations)
      .field("auth_backend", &self.auth_backend)
      .field("static_tokens", &self.static_tokens.len())
      .field("log_format", &self.log_format)
      .finish()
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|key| env::var(key).ok())
  }

  /// Builds the configuration from an arbitrary key lookup. Empty values count as unset.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let server_host = get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port: u16 = parse_or(&get, "SERVER_PORT", 8080)?;
    let store_backend = match get("STORE_BACKEND") {
      Some(v) => v.parse()?,
      None => StoreBackend::Postgres,
    };
    let database_url = get("DATABASE_URL");
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required when STORE_BACKEND=postgres)".to_string(),
      ));
    }

    let database_max_connections: u32 = parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10)?;
    if database_max_connections == 0 {
      return Err(AppError::Config("DATABASE_MAX_CONNECTIONS must be at least 1".to_string()));
    }
    let database_acquire_timeout = Duration::from_secs(parse_or(&get, "DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?);
    let request_timeout_secs: u64 = parse_or(&get, "REQUEST_TIMEOUT_SECS", 10)?;
    if request_timeout_secs == 0 {
      return Err(AppError::Config("REQUEST_TIMEOUT_SECS must be at least 1".to_string()));
    }
    let run_migrations: bool = parse_or(&get, "RUN_MIGRATIONS", false)?;

    let auth_backend = match get("AUTH_BACKEND") {
      Some(v) => v.parse()?,
      None => AuthBackend::Sessions,
    };
    if auth_backend == AuthBackend::Sessions && store_backend != StoreBackend::Postgres {
      return Err(AppError::Config(
        "AUTH_BACKEND=sessions needs the postgres store; use AUTH_BACKEND=static with STORE_BACKEND=memory".to_string(),
      ));
    }
    let static_tokens = match get("AUTH_STATIC_TOKENS") {
      Some(raw) => parse_static_tokens(&raw)?,
      None => HashMap::new(),
    };

    let log_format = match get("LOG_FORMAT") {
      Some(v) => v.parse()?,
      None => LogFormat::Pretty,
    };

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      database_max_connections,
      database_acquire_timeout,
      request_timeout: Duration::from_secs(request_timeout_secs),
      run_migrations,
      auth_backend,
      static_tokens,
      log_format,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
  G: Fn(&str) -> Option<String>,
{
  match get(key) {
    Some(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", key, raw, e))),
    None => Ok(default),
  }
}

/// Parses `token=uuid,token=uuid`.
fn parse_static_tokens(raw: &str) -> Result<HashMap<String, Uuid>> {
  let mut tokens = HashMap::new();
  for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
    let (token, user_id) = pair
      .split_once('=')
      .ok_or_else(|| AppError::Config("AUTH_STATIC_TOKENS entries must look like token=uuid".to_string()))?;
    let token = token.trim();
    if token.is_empty() {
      return Err(AppError::Config("AUTH_STATIC_TOKENS contains an empty token".to_string()));
    }
    let user_id = Uuid::parse_str(user_id.trim())
      .map_err(|e| AppError::Config(format!("AUTH_STATIC_TOKENS has an invalid user id for a token: {}", e)))?;
    tokens.insert(token.to_string(), user_id);
  }
  Ok(tokens)
}
