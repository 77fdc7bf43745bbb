// server/src/pipelines/checkout_pipeline.rs

//! CreateOrder as a pipeline. Everything between `begin_transaction` and `commit_transaction`
//! happens inside one store transaction held by the context; if any step fails, the context is
//! dropped with the transaction still open and the store rolls it back.

use crate::errors::{AppError, Result};
use crate::pipelines::common_steps;
use crate::pipelines::contexts::{open_tx, CheckoutCtxData};
use tracing::{info, instrument, warn};
use unisale_core::{FlowRegistry, Pipeline, PipelineControl};

pub const CHECKOUT_STEPS: [&str; 9] = [
  "validate_delivery_info",
  "begin_transaction",
  "load_cart_snapshot",
  "compute_order_total",
  "insert_order_record",
  "insert_delivery_address",
  "insert_order_items",
  "clear_cart",
  "commit_transaction",
];

pub fn build_checkout_pipeline() -> Pipeline<CheckoutCtxData, AppError> {
  let steps: Vec<(&str, bool, Option<_>)> = CHECKOUT_STEPS.iter().map(|name| (*name, false, None)).collect();
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(&steps);

  p.on_root("validate_delivery_info", |ctx| Box::pin(validate_delivery_info(ctx)));
  p.on_root("begin_transaction", |ctx| Box::pin(common_steps::begin_transaction(ctx)));
  p.on_root("load_cart_snapshot", |ctx| Box::pin(load_cart_snapshot(ctx)));
  p.on_root("compute_order_total", |ctx| Box::pin(compute_order_total(ctx)));
  p.on_root("insert_order_record", |ctx| Box::pin(insert_order_record(ctx)));
  p.on_root("insert_delivery_address", |ctx| Box::pin(insert_delivery_address(ctx)));
  p.on_root("insert_order_items", |ctx| Box::pin(insert_order_items(ctx)));
  p.on_root("clear_cart", |ctx| Box::pin(clear_cart(ctx)));
  p.on_root("commit_transaction", |ctx| Box::pin(common_steps::commit_transaction(ctx)));
  p
}

pub fn register_checkout_pipeline(registry: &FlowRegistry<AppError>) {
  registry.register_pipeline(build_checkout_pipeline());
}

// Runs before the transaction is opened so bad input never touches the store.
async fn validate_delivery_info(ctx: &mut CheckoutCtxData) -> Result<PipelineControl> {
  let address = ctx.delivery_info.validate()?;
  ctx.delivery_address = Some(address);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "checkout_step::load_cart", skip_all, fields(user_id = %ctx.caller))]
async fn load_cart_snapshot(ctx: &mut CheckoutCtxData) -> Result<PipelineControl> {
  let caller = ctx.caller;
  let lines = open_tx(&mut ctx.tx)?.lock_cart_for_checkout(caller).await?;
  if lines.is_empty() {
    info!("Checkout rejected: cart is empty.");
    return Err(AppError::EmptyCart);
  }
  info!(lines = lines.len(), "Cart snapshot locked.");
  ctx.lines = lines;
  Ok(PipelineControl::Continue)
}

async fn compute_order_total(ctx: &mut CheckoutCtxData) -> Result<PipelineControl> {
  let mut total: i64 = 0;
  for line in &ctx.lines {
    total = line
      .line_total_cents()
      .and_then(|line_total| total.checked_add(line_total))
      .ok_or_else(|| AppError::InvalidInput("Order total is too large".to_string()))?;
  }
  ctx.total_amount_cents = total;
  Ok(PipelineControl::Continue)
}

#[instrument(name = "checkout_step::insert_order", skip_all, fields(user_id = %ctx.caller))]
async fn insert_order_record(ctx: &mut CheckoutCtxData) -> Result<PipelineControl> {
  let (caller, total) = (ctx.caller, ctx.total_amount_cents);
  let order = open_tx(&mut ctx.tx)?.insert_order(caller, total).await?;
  info!(order_id = %order.id, total_amount_cents = total, "Order row inserted.");
  ctx.order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn insert_delivery_address(ctx: &mut CheckoutCtxData) -> Result<PipelineControl> {
  let order_id = placed_order_id(ctx)?;
  let caller = ctx.caller;
  let address = ctx
    .delivery_address
    .as_ref()
    .ok_or_else(|| AppError::Internal("Delivery address was not validated".to_string()))?;
  open_tx(&mut ctx.tx)?
    .insert_delivery_address(order_id, caller, address)
    .await?;
  Ok(PipelineControl::Continue)
}

#[instrument(name = "checkout_step::insert_items", skip_all, fields(lines = ctx.lines.len()))]
async fn insert_order_items(ctx: &mut CheckoutCtxData) -> Result<PipelineControl> {
  let order_id = placed_order_id(ctx)?;
  let tx = open_tx(&mut ctx.tx)?;
  for (idx, line) in ctx.lines.iter().enumerate() {
    let line_no = i32::try_from(idx + 1).map_err(|_| AppError::InvalidInput("Too many cart lines".to_string()))?;
    tx.insert_order_item(order_id, line_no, line).await?;
  }
  Ok(PipelineControl::Continue)
}

// Only the snapshot lines are removed. A line added by another request after the lock was taken
// stays in the cart for a later checkout.
async fn clear_cart(ctx: &mut CheckoutCtxData) -> Result<PipelineControl> {
  let caller = ctx.caller;
  let product_ids: Vec<uuid::Uuid> = ctx.lines.iter().map(|l| l.product_id).collect();
  let locked = product_ids.len() as u64;
  let deleted = open_tx(&mut ctx.tx)?.clear_cart(caller, &product_ids).await?;
  if deleted != locked {
    warn!(user_id = %caller, locked, deleted, "Cart changed while checking out.");
    return Err(AppError::Conflict(
      "Cart changed during checkout, please try again".to_string(),
    ));
  }
  Ok(PipelineControl::Continue)
}

fn placed_order_id(ctx: &CheckoutCtxData) -> Result<uuid::Uuid> {
  ctx
    .order
    .as_ref()
    .map(|o| o.id)
    .ok_or_else(|| AppError::Internal("Order record missing from checkout context".to_string()))
}
