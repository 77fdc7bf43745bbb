// server/src/services/cart_service.rs

use crate::errors::{AppError, Result};
use crate::models::{CartItem, CartLine};
use crate::pipelines::contexts::AddToCartCtxData;
use crate::services::with_deadline;
use crate::state::AppState;
use tracing::{info, instrument};
use uuid::Uuid;

/// Adds `quantity` of a product to the caller's cart and returns the resulting row.
#[instrument(name = "cart_service::add_to_cart", skip(state), err(Display))]
pub async fn add_to_cart(state: &AppState, caller: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem> {
  let mut ctx = AddToCartCtxData::new(state.store.clone(), caller, product_id, quantity);
  let outcome = with_deadline(state.config.request_timeout, "add_to_cart", state.pipelines.run(&mut ctx)).await?;
  if !outcome.is_completed() {
    return Err(AppError::Internal("Add to cart was halted before completion".to_string()));
  }
  ctx
    .cart_item
    .ok_or_else(|| AppError::Internal("Cart update completed without a cart row".to_string()))
}

/// Removes the caller's line for `product_id`. Removing an absent line is not an error.
#[instrument(name = "cart_service::remove_from_cart", skip(state), err(Display))]
pub async fn remove_from_cart(state: &AppState, caller: Uuid, product_id: Uuid) -> Result<bool> {
  with_deadline(state.config.request_timeout, "remove_from_cart", async {
    let mut tx = state.store.begin().await?;
    let removed = tx.delete_cart_line(caller, product_id).await?;
    tx.commit().await?;
    info!(removed, "Cart line removal processed.");
    Ok::<_, AppError>(removed > 0)
  })
  .await
}

#[instrument(name = "cart_service::list_cart", skip(state), err(Display))]
pub async fn list_cart(state: &AppState, caller: Uuid) -> Result<Vec<CartLine>> {
  with_deadline(state.config.request_timeout, "list_cart", async {
    let mut tx = state.store.begin().await?;
    let lines = tx.cart_lines(caller).await?;
    tx.commit().await?;
    Ok::<_, AppError>(lines)
  })
  .await
}
