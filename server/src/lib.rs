// server/src/lib.rs

//! UniSale marketplace backend: cart, checkout and order history over a transactional store.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod web;

pub use crate::errors::{AppError, Result};
pub use crate::state::AppState;
