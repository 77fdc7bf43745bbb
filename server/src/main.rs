// server/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_actix_web::TracingLogger;

use unisale_server::config::{AppConfig, AuthBackend, LogFormat, StoreBackend};
use unisale_server::services::identity::{IdentityResolver, SessionTableResolver, StaticTokenResolver};
use unisale_server::store::{MemoryStore, PgStore, Store};
use unisale_server::web::configure_app_routes;
use unisale_server::{telemetry, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  let config = AppConfig::from_env();
  let log_format = config.as_ref().map(|c| c.log_format).unwrap_or(LogFormat::Pretty);
  telemetry::init_tracing(log_format)?;

  let config = config
    .inspect_err(|e| error!(error = %e, "Failed to load application configuration."))
    .context("Failed to load application configuration")?;
  info!(config = ?config, "Starting UniSale API server...");
  let config = Arc::new(config);

  let static_identity =
    || -> Arc<dyn IdentityResolver> { Arc::new(StaticTokenResolver::new(config.static_tokens.clone())) };

  let (store, identity): (Arc<dyn Store>, Arc<dyn IdentityResolver>) = match config.store_backend {
    StoreBackend::Postgres => {
      let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required for the postgres store")?;
      let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.database_acquire_timeout)
        .connect(database_url)
        .await
        .inspect_err(|e| error!(error = %e, "Failed to connect to the database."))
        .context("Failed to connect to the database")?;
      info!("Successfully connected to the database.");

      if config.run_migrations {
        sqlx::migrate!("./migrations")
          .run(&pool)
          .await
          .context("Failed to apply database migrations")?;
        info!("Database migrations applied.");
      }

      let identity: Arc<dyn IdentityResolver> = match config.auth_backend {
        AuthBackend::Sessions => Arc::new(SessionTableResolver::new(pool.clone())),
        AuthBackend::Static => static_identity(),
      };
      let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
      (store, identity)
    }
    StoreBackend::Memory => {
      warn!("Using the in-memory store; all data is lost when the server stops.");
      let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
      (store, static_identity())
    }
  };

  let app_state = AppState::new(store, identity, config.clone());

  let server_address = config.bind_address();
  info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("Failed to bind {}", server_address))?
  .run()
  .await
  .context("HTTP server terminated with an error")?;

  info!("Server stopped.");
  Ok(())
}
