// core/src/pipeline/execution.rs

//! `Pipeline::run()`: executes the steps and their handlers against a context.

use crate::control::{PipelineControl, PipelineResult};
use crate::error::FlowError;
use crate::handler::Handler;
use crate::pipeline::definition::Pipeline;
use crate::step::StepDef;
use std::time::Instant;
use tracing::{event, info_span, Instrument, Level};

/// Whether the pipeline continues after a step or phase.
enum Flow {
  Continue,
  Stopped,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Executes the pipeline against `ctx`.
  ///
  /// Steps run in declaration order; within a step `before`, `on` and `after` handlers run in
  /// registration order. The first handler error aborts the run and is returned as-is. Resources
  /// held by the context (an open transaction, for instance) are released by the caller, which
  /// for a dropped transaction means rollback.
  pub async fn run(&self, ctx: &mut TData) -> Result<PipelineResult, Err> {
    let run_span = info_span!(
      "pipeline_run",
      context_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    );

    async move {
      event!(Level::DEBUG, "Pipeline execution starting.");

      for (step_idx, step_def) in self.steps.iter().enumerate() {
        let step_span = info_span!(
          "pipeline_step",
          step_name = step_def.name.as_str(),
          step_index = step_idx,
          optional = step_def.optional
        );
        let flow = self.run_step(step_def, &mut *ctx).instrument(step_span).await?;
        if let Flow::Stopped = flow {
          return Ok(PipelineResult::Stopped);
        }
      }

      event!(Level::DEBUG, "Pipeline execution completed successfully.");
      Ok(PipelineResult::Completed)
    }
    .instrument(run_span)
    .await
  }

  async fn run_step(&self, step_def: &StepDef<TData>, ctx: &mut TData) -> Result<Flow, Err> {
    if let Some(skip_cond_fn) = &step_def.skip_if {
      if skip_cond_fn(&*ctx) {
        event!(Level::INFO, "Step skipped due to 'skip_if' condition.");
        return Ok(Flow::Continue);
      }
    }

    let step_name = step_def.name.as_str();
    let before = self.before.get(step_name).filter(|v| !v.is_empty());
    let on = self.on.get(step_name).filter(|v| !v.is_empty());
    let after = self.after.get(step_name).filter(|v| !v.is_empty());

    if before.is_none() && on.is_none() && after.is_none() {
      if step_def.optional {
        event!(Level::DEBUG, "Optional step has no handlers, skipping.");
        return Ok(Flow::Continue);
      }
      event!(Level::ERROR, "Non-optional step has no handlers.");
      return Err(Err::from(FlowError::HandlerMissing {
        step_name: step_def.name.clone(),
      }));
    }

    let started = Instant::now();
    for (phase, handlers) in [("before", before), ("on", on), ("after", after)] {
      if let Some(handlers) = handlers {
        if let Flow::Stopped = run_phase(phase, handlers, &mut *ctx).await? {
          return Ok(Flow::Stopped);
        }
      }
    }
    event!(
      Level::DEBUG,
      elapsed_ms = started.elapsed().as_millis() as u64,
      "Step processing finished successfully."
    );
    Ok(Flow::Continue)
  }
}

async fn run_phase<TData, Err>(phase: &'static str, handlers: &[Handler<TData, Err>], ctx: &mut TData) -> Result<Flow, Err>
where
  Err: std::error::Error,
{
  for (handler_idx, handler_fn) in handlers.iter().enumerate() {
    match handler_fn(&mut *ctx).await {
      Ok(PipelineControl::Continue) => {}
      Ok(PipelineControl::Stop) => {
        event!(Level::INFO, phase, handler_index = handler_idx, "Pipeline stopped by a handler.");
        return Ok(Flow::Stopped);
      }
      Err(e) => {
        event!(Level::WARN, phase, handler_index = handler_idx, error = %e, "Handler failed.");
        return Err(e);
      }
    }
  }
  Ok(Flow::Continue)
}
