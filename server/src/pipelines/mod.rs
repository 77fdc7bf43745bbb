// server/src/pipelines/mod.rs

//! Defines and registers the pipelines used by the marketplace.

use crate::errors::AppError;
use unisale_core::FlowRegistry;

pub mod common_steps;
pub mod contexts;

pub mod cart_pipeline;
pub mod checkout_pipeline;

/// Registers every pipeline with `registry`. Called once at startup.
pub fn register_all_pipelines(registry: &FlowRegistry<AppError>) {
  cart_pipeline::register_add_to_cart_pipeline(registry);
  checkout_pipeline::register_checkout_pipeline(registry);
  tracing::info!("All application pipelines registered.");
}
