// server/src/pipelines/cart_pipeline.rs

use crate::errors::{AppError, Result};
use crate::pipelines::common_steps;
use crate::pipelines::contexts::{open_tx, AddToCartCtxData};
use tracing::{info, instrument, warn};
use unisale_core::{FlowRegistry, Pipeline, PipelineControl};

pub const ADD_TO_CART_STEPS: [&str; 6] = [
  "validate_cart_input",
  "begin_transaction",
  "fetch_product_for_cart",
  "check_product_ownership",
  "upsert_cart_line",
  "commit_transaction",
];

pub fn build_add_to_cart_pipeline() -> Pipeline<AddToCartCtxData, AppError> {
  let steps: Vec<(&str, bool, Option<_>)> = ADD_TO_CART_STEPS.iter().map(|name| (*name, false, None)).collect();
  let mut p = Pipeline::<AddToCartCtxData, AppError>::new(&steps);

  p.on_root("validate_cart_input", |ctx| Box::pin(validate_cart_input(ctx)));
  p.on_root("begin_transaction", |ctx| Box::pin(common_steps::begin_transaction(ctx)));
  p.on_root("fetch_product_for_cart", |ctx| Box::pin(fetch_product_for_cart(ctx)));
  p.on_root("check_product_ownership", |ctx| Box::pin(check_product_ownership(ctx)));
  p.on_root("upsert_cart_line", |ctx| Box::pin(upsert_cart_line(ctx)));
  p.on_root("commit_transaction", |ctx| Box::pin(common_steps::commit_transaction(ctx)));
  p
}

pub fn register_add_to_cart_pipeline(registry: &FlowRegistry<AppError>) {
  registry.register_pipeline(build_add_to_cart_pipeline());
}

async fn validate_cart_input(ctx: &mut AddToCartCtxData) -> Result<PipelineControl> {
  if ctx.quantity < 1 {
    warn!(quantity = ctx.quantity, "Add to cart rejected: quantity must be at least 1.");
    return Err(AppError::InvalidInput("Quantity must be at least 1".to_string()));
  }
  Ok(PipelineControl::Continue)
}

#[instrument(name = "cart_step::fetch_product", skip_all, fields(product_id = %ctx.product_id))]
async fn fetch_product_for_cart(ctx: &mut AddToCartCtxData) -> Result<PipelineControl> {
  let product_id = ctx.product_id;
  let product = open_tx(&mut ctx.tx)?.find_product(product_id).await?;
  match product {
    Some(product) => {
      ctx.product = Some(product);
      Ok(PipelineControl::Continue)
    }
    None => {
      warn!("Product not found.");
      Err(AppError::NotFound("Product not found".to_string()))
    }
  }
}

async fn check_product_ownership(ctx: &mut AddToCartCtxData) -> Result<PipelineControl> {
  let seller_id = ctx
    .product
    .as_ref()
    .map(|p| p.user_id)
    .ok_or_else(|| AppError::Internal("Product missing from cart context".to_string()))?;
  if seller_id == ctx.caller {
    warn!(user_id = %ctx.caller, product_id = %ctx.product_id, "User tried to add their own product to the cart.");
    return Err(AppError::Forbidden("You cannot add your own product to the cart".to_string()));
  }
  Ok(PipelineControl::Continue)
}

#[instrument(name = "cart_step::upsert_line", skip_all, fields(user_id = %ctx.caller, product_id = %ctx.product_id))]
async fn upsert_cart_line(ctx: &mut AddToCartCtxData) -> Result<PipelineControl> {
  let (caller, product_id, quantity) = (ctx.caller, ctx.product_id, ctx.quantity);
  let item = open_tx(&mut ctx.tx)?.upsert_cart_line(caller, product_id, quantity).await?;
  info!(new_quantity = item.quantity, "Cart line upserted.");
  ctx.cart_item = Some(item);
  Ok(PipelineControl::Continue)
}
