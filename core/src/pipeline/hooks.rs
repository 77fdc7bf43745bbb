// core/src/pipeline/hooks.rs

//! Registration of `before`, `on` and `after` handlers for pipeline steps.

use crate::error::FlowError;
use crate::handler::{Handler, StepFuture};
use crate::pipeline::definition::Pipeline;
use tracing::{event, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Registers a handler that runs before the `on` handlers of `step_name`.
  ///
  /// Closures are written as `|ctx| Box::pin(async move { ... })`; plain
  /// `fn step(ctx: &mut TData) -> StepFuture<'_, Err>` items work as well.
  pub fn before_root<F>(&mut self, step_name: &str, handler_fn: F)
  where
    F: for<'a> Fn(&'a mut TData) -> StepFuture<'a, Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler: Handler<TData, Err> = Box::new(handler_fn);
    self.before.entry(step_name.to_string()).or_default().push(handler);
    event!(Level::TRACE, %step_name, phase = "before", "Handler registered.");
  }

  /// Registers the main handler of `step_name`. Several may be registered; they run in order.
  pub fn on_root<F>(&mut self, step_name: &str, handler_fn: F)
  where
    F: for<'a> Fn(&'a mut TData) -> StepFuture<'a, Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler: Handler<TData, Err> = Box::new(handler_fn);
    self.on.entry(step_name.to_string()).or_default().push(handler);
    event!(Level::TRACE, %step_name, phase = "on", "Handler registered.");
  }

  /// Registers a handler that runs after the `on` handlers of `step_name`.
  pub fn after_root<F>(&mut self, step_name: &str, handler_fn: F)
  where
    F: for<'a> Fn(&'a mut TData) -> StepFuture<'a, Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler: Handler<TData, Err> = Box::new(handler_fn);
    self.after.entry(step_name.to_string()).or_default().push(handler);
    event!(Level::TRACE, %step_name, phase = "after", "Handler registered.");
  }
}
