// core/src/registry.rs

//! `FlowRegistry<E>`: a type-keyed registry for pipelines.
//! A pipeline is registered under its context type and run by handing the registry a context.

use crate::control::PipelineResult;
use crate::error::FlowError;
use crate::pipeline::Pipeline;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, Level};

/// Type-erased runner so the registry can hold pipelines over different context types.
#[async_trait]
trait ErasedPipeline<ApplicationError>: Send + Sync
where
  ApplicationError: std::error::Error + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx: &mut (dyn Any + Send)) -> Result<PipelineResult, ApplicationError>;
}

struct PipelineRunner<TData, HandlerError, ApplicationError>
where
  TData: 'static + Send,
  HandlerError: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipeline: Pipeline<TData, HandlerError>,
  _phantom_app_err: PhantomData<fn() -> ApplicationError>,
}

#[async_trait]
impl<TData, HandlerError, ApplicationError> ErasedPipeline<ApplicationError>
  for PipelineRunner<TData, HandlerError, ApplicationError>
where
  TData: 'static + Send,
  HandlerError: std::error::Error + From<FlowError> + Send + Sync + 'static,
  ApplicationError: std::error::Error + From<HandlerError> + From<FlowError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx: &mut (dyn Any + Send)) -> Result<PipelineResult, ApplicationError> {
    let typed_ctx = match ctx.downcast_mut::<TData>() {
      Some(typed_ctx) => typed_ctx,
      None => {
        let expected_type = std::any::type_name::<TData>();
        event!(Level::ERROR, "Context type mismatch. Expected {}.", expected_type);
        return Err(ApplicationError::from(FlowError::TypeMismatch {
          expected_type: expected_type.to_string(),
        }));
      }
    };
    self.pipeline.run(typed_ctx).await.map_err(ApplicationError::from)
  }
}

/// Registry of pipelines keyed by context type.
///
/// `ApplicationError` is what `run` returns; registry-level failures (no pipeline for a context
/// type) are converted from `FlowError`.
pub struct FlowRegistry<ApplicationError = FlowError>
where
  ApplicationError: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  registry: RwLock<HashMap<TypeId, Arc<dyn ErasedPipeline<ApplicationError>>>>,
}

impl<ApplicationError> FlowRegistry<ApplicationError>
where
  ApplicationError: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      registry: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `pipeline` under `TData`, replacing any pipeline registered for that type.
  pub fn register_pipeline<TData, HandlerError>(&self, pipeline: Pipeline<TData, HandlerError>)
  where
    TData: 'static + Send,
    HandlerError: std::error::Error + From<FlowError> + Send + Sync + 'static,
    ApplicationError: From<HandlerError>,
  {
    event!(
      Level::DEBUG,
      context_type = %std::any::type_name::<TData>(),
      steps = ?pipeline.step_names(),
      "Registering pipeline."
    );
    let runner = PipelineRunner::<TData, HandlerError, ApplicationError> {
      pipeline,
      _phantom_app_err: PhantomData,
    };
    self.registry.write().insert(TypeId::of::<TData>(), Arc::new(runner));
  }

  pub fn is_registered<TData: 'static>(&self) -> bool {
    self.registry.read().contains_key(&TypeId::of::<TData>())
  }

  /// Runs the pipeline registered for `TData` against `ctx`.
  pub async fn run<TData>(&self, ctx: &mut TData) -> Result<PipelineResult, ApplicationError>
  where
    TData: 'static + Send,
  {
    let type_name = std::any::type_name::<TData>();
    event!(Level::DEBUG, context_type = %type_name, "Dispatching pipeline.");

    // The guard must be released before awaiting the pipeline.
    let runner = self.registry.read().get(&TypeId::of::<TData>()).cloned();
    let runner = runner.ok_or_else(|| {
      event!(Level::ERROR, "No pipeline registered for context type {}.", type_name);
      ApplicationError::from(FlowError::ConfigurationError {
        scope: "FlowRegistry::run".to_string(),
        message: format!("No pipeline registered for context type {}", type_name),
      })
    })?;

    runner.run_erased(ctx).await
  }
}

impl<ApplicationError> Default for FlowRegistry<ApplicationError>
where
  ApplicationError: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
