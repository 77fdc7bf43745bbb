// core/src/handler.rs

//! Handler type for pipeline steps.

use crate::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// Future returned by a step handler. It may borrow the context for `'a`.
pub type StepFuture<'a, Err> = Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send + 'a>>;

/// A boxed step handler.
///
/// The handler receives the context by mutable reference and returns a future that may hold
/// that borrow until it resolves. Steps therefore run strictly one after another and a handler
/// can keep resources stored in the context (for example an open transaction) in use across
/// suspension points without any locking.
pub type Handler<TData, Err> = Box<dyn for<'a> Fn(&'a mut TData) -> StepFuture<'a, Err> + Send + Sync>;
