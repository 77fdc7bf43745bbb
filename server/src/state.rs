// server/src/state.rs

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines::register_all_pipelines;
use crate::services::identity::IdentityResolver;
use crate::store::Store;
use std::sync::Arc;
use unisale_core::FlowRegistry;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Store>,
  pub pipelines: Arc<FlowRegistry<AppError>>,
  pub identity: Arc<dyn IdentityResolver>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Builds the state with every pipeline registered.
  pub fn new(store: Arc<dyn Store>, identity: Arc<dyn IdentityResolver>, config: Arc<AppConfig>) -> Self {
    let pipelines = FlowRegistry::<AppError>::new();
    register_all_pipelines(&pipelines);
    Self {
      store,
      pipelines: Arc::new(pipelines),
      identity,
      config,
    }
  }
}
