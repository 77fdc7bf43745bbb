// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use tracing::Level;
use unisale_core::{FlowError, PipelineControl, StepFuture};

#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Flow framework error: {0}")]
  Flow(String), // FlowError is not PartialEq, keep its Debug rendering

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(fe: FlowError) -> Self {
    TestError::Flow(format!("{:?}", fe))
  }
}

/// Pins down the higher-ranked signature so closures can be built outside a `Pipeline::on_root` call.
pub fn handler<F>(f: F) -> F
where
  F: for<'a> Fn(&'a mut TestContext) -> StepFuture<'a, TestError> + Send + Sync + 'static,
{
  f
}

/// Handler that records its name, bumps the counter and appends to the message.
/// Returns `Stop` when `should_stop_at` names it.
pub fn simple_handler(
  step_name: &'static str,
  message_to_append: &'static str,
) -> impl for<'a> Fn(&'a mut TestContext) -> StepFuture<'a, TestError> + Send + Sync + 'static {
  handler(move |ctx| {
    Box::pin(async move {
      ctx.counter += 1;
      ctx.message.push_str(message_to_append);
      ctx.steps_executed.push(step_name.to_string());
      tracing::debug!(target: "test_handlers", step = %step_name, counter = ctx.counter, "executed");
      if ctx.should_stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn failing_handler(
  step_name: &'static str,
  error_message: &'static str,
) -> impl for<'a> Fn(&'a mut TestContext) -> StepFuture<'a, TestError> + Send + Sync + 'static {
  handler(move |ctx| {
    Box::pin(async move {
      ctx.steps_executed.push(step_name.to_string());
      tracing::warn!(target: "test_handlers", step = %step_name, "failing with: '{}'", error_message);
      Err(TestError::Handler(error_message.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
