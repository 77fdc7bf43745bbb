// core/src/lib.rs

//! UniSale step-pipeline engine.
//!
//! Business flows that touch several tables (adding to a cart, checking out) are written as
//! pipelines of named steps over a typed context:
//!  - Named steps with before/on/after hooks.
//!  - Asynchronous handlers that borrow the context mutably for the life of their future,
//!    so a handler can keep a database transaction open across `.await` points.
//!  - Early stopping via `PipelineControl::Stop`, immediate abort on error.
//!  - Optional steps and per-step skip predicates.
//!  - A type-keyed registry for running the pipeline that belongs to a context type.

pub mod control;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod registry;
pub mod step;

pub use crate::control::{PipelineControl, PipelineResult};
pub use crate::error::{FlowError, FlowResult};
pub use crate::handler::{Handler, StepFuture};
pub use crate::pipeline::Pipeline;
pub use crate::registry::FlowRegistry;
pub use crate::step::{SkipCondition, StepDef};

/*
    Typical use:
    1. Define a context struct `MyCtx` carrying the inputs, the open resources and the outputs.
    2. Create a `Pipeline<MyCtx, MyError>` and declare its steps.
    3. Attach handlers with `.on_root()`, `.before_root()`, `.after_root()`.
    4. Register the pipeline with a `FlowRegistry<MyError>` at startup.
    5. Per request, build `MyCtx` and call `registry.run(&mut ctx).await`.
*/
