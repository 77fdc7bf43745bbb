// server/src/services/checkout_service.rs

use crate::errors::{AppError, Result};
use crate::models::{DeliveryInfo, Order};
use crate::pipelines::contexts::CheckoutCtxData;
use crate::services::with_deadline;
use crate::state::AppState;
use tracing::{info, instrument};
use uuid::Uuid;

/// Turns the caller's cart into an order. Either the order, its items and its delivery address
/// are committed together with the emptied cart, or nothing changes.
#[instrument(name = "checkout_service::create_order", skip(state, delivery_info), err(Display))]
pub async fn create_order(state: &AppState, caller: Uuid, delivery_info: DeliveryInfo) -> Result<Order> {
  let mut ctx = CheckoutCtxData::new(state.store.clone(), caller, delivery_info);
  let outcome = with_deadline(state.config.request_timeout, "create_order", state.pipelines.run(&mut ctx)).await?;
  if !outcome.is_completed() {
    return Err(AppError::Internal("Checkout was halted before completion".to_string()));
  }

  let order = ctx
    .order
    .ok_or_else(|| AppError::Internal("Checkout completed without an order record".to_string()))?;
  info!(order_id = %order.id, total_amount_cents = order.total_amount_cents, items = ctx.lines.len(), "Order placed.");
  Ok(order)
}
