// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use serial_test::serial;
use std::sync::Arc;
use unisale_core::{Pipeline, PipelineControl, PipelineResult, SkipCondition};

#[tokio::test]
#[serial]
async fn test_pipeline_runs_steps_in_order() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TestContext, TestError>::new(&[("step1", false, None), ("step2", false, None), ("step3", false, None)]);

  pipeline.on_root("step1", simple_handler("step1", " S1"));
  pipeline.on_root("step2", simple_handler("step2", " S2"));
  pipeline.on_root("step3", simple_handler("step3", " S3"));

  let mut ctx = TestContext::default();
  let result = pipeline.run(&mut ctx).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.counter, 3);
  assert_eq!(ctx.message, " S1 S2 S3");
  assert_eq!(ctx.steps_executed, vec!["step1", "step2", "step3"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_stops_on_pipeline_control_stop() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("stepA", false, None),
    ("stopStep", false, None),
    ("stepC", false, None),
  ]);

  pipeline.on_root("stepA", simple_handler("stepA", "A"));
  pipeline.on_root("stopStep", |ctx| {
    Box::pin(async move {
      ctx.steps_executed.push("stopStep".to_string());
      Ok(PipelineControl::Stop)
    })
  });
  pipeline.on_root("stepC", simple_handler("stepC", "C"));

  let mut ctx = TestContext::default();
  let result = pipeline.run(&mut ctx).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  assert_eq!(ctx.counter, 1);
  assert_eq!(ctx.message, "A");
  assert_eq!(ctx.steps_executed, vec!["stepA", "stopStep"]);
}

#[tokio::test]
#[serial]
async fn test_before_on_after_handlers_run_in_phase_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("main", false, None), ("next", false, None)]);

  pipeline.after_root("main", simple_handler("after", "[a]"));
  pipeline.on_root("main", simple_handler("on1", "[o1]"));
  pipeline.before_root("main", simple_handler("before", "[b]"));
  pipeline.on_root("main", simple_handler("on2", "[o2]"));
  pipeline.on_root("next", simple_handler("next", "[n]"));

  let mut ctx = TestContext::default();
  pipeline.run(&mut ctx).await.unwrap();

  assert_eq!(ctx.steps_executed, vec!["before", "on1", "on2", "after", "next"]);
  assert_eq!(ctx.message, "[b][o1][o2][a][n]");
}

#[tokio::test]
#[serial]
async fn test_stop_in_before_phase_skips_rest_of_step() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("guarded", false, None), ("later", false, None)]);

  pipeline.before_root("guarded", simple_handler("gate", "G"));
  pipeline.on_root("guarded", simple_handler("guarded", "X"));
  pipeline.on_root("later", simple_handler("later", "L"));

  let mut ctx = TestContext {
    should_stop_at: Some("gate".to_string()),
    ..Default::default()
  };
  let result = pipeline.run(&mut ctx).await.unwrap();

  assert_eq!(result, PipelineResult::Stopped);
  assert!(!result.is_completed());
  assert_eq!(ctx.steps_executed, vec!["gate"]);
}

#[tokio::test]
#[serial]
async fn test_optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("first", false, None),
    ("maybe", true, None),
    ("last", false, None),
  ]);
  pipeline.on_root("first", simple_handler("first", "1"));
  pipeline.on_root("last", simple_handler("last", "3"));

  let mut ctx = TestContext::default();
  let result = pipeline.run(&mut ctx).await.unwrap();

  assert!(result.is_completed());
  assert_eq!(ctx.steps_executed, vec!["first", "last"]);
}

#[tokio::test]
#[serial]
async fn test_skip_condition_evaluated_against_current_context() {
  setup_tracing();
  let skip_when_counter_positive: SkipCondition<TestContext> = Arc::new(|ctx: &TestContext| ctx.counter > 0);
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("bump", false, None),
    ("conditional", false, Some(skip_when_counter_positive)),
    ("tail", false, None),
  ]);
  pipeline.on_root("bump", simple_handler("bump", "B"));
  pipeline.on_root("conditional", simple_handler("conditional", "C"));
  pipeline.on_root("tail", simple_handler("tail", "T"));

  let mut ctx = TestContext::default();
  pipeline.run(&mut ctx).await.unwrap();
  assert_eq!(ctx.steps_executed, vec!["bump", "tail"]);

  // Without the predicate the step runs again.
  pipeline.set_skip_condition("conditional", None).unwrap();
  let mut ctx = TestContext::default();
  pipeline.run(&mut ctx).await.unwrap();
  assert_eq!(ctx.steps_executed, vec!["bump", "conditional", "tail"]);
}

#[tokio::test]
#[serial]
async fn test_handler_can_hold_context_borrow_across_await() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("slow", false, None), ("check", false, None)]);

  pipeline.on_root("slow", |ctx| {
    Box::pin(async move {
      ctx.message.push_str("before-sleep;");
      tokio::time::sleep(std::time::Duration::from_millis(5)).await;
      ctx.message.push_str("after-sleep;");
      ctx.counter += 10;
      Ok(PipelineControl::Continue)
    })
  });
  pipeline.on_root("check", |ctx| {
    Box::pin(async move {
      ctx.steps_executed.push(format!("saw:{}", ctx.counter));
      Ok(PipelineControl::Continue)
    })
  });

  let mut ctx = TestContext::default();
  pipeline.run(&mut ctx).await.unwrap();

  assert_eq!(ctx.message, "before-sleep;after-sleep;");
  assert_eq!(ctx.steps_executed, vec!["saw:10"]);
}

#[tokio::test]
#[serial]
async fn test_step_names_preserve_declaration_order() {
  let pipeline = Pipeline::<TestContext, TestError>::new(&[("a", false, None), ("b", true, None), ("c", false, None)]);
  assert_eq!(pipeline.step_names(), vec!["a", "b", "c"]);
}
