// server/src/services/order_service.rs

use crate::errors::{AppError, Result};
use crate::models::{DeliveryAddress, Order, OrderItemView, OrderView};
use crate::services::with_deadline;
use crate::state::AppState;
use crate::store::StoreTx;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Orders of the caller, newest first, each with its address and items.
#[instrument(name = "order_service::list_orders", skip(state), err(Display))]
pub async fn list_orders(state: &AppState, caller: Uuid) -> Result<Vec<OrderView>> {
  with_deadline(state.config.request_timeout, "list_orders", async {
    let mut tx = state.store.begin().await?;
    let orders = tx.orders_for_user(caller).await?;
    let views = assemble_views(tx.as_mut(), orders).await?;
    tx.commit().await?;
    Ok::<_, AppError>(views)
  })
  .await
}

/// One order of the caller. Orders of other users are reported as missing.
#[instrument(name = "order_service::get_order", skip(state), err(Display))]
pub async fn get_order(state: &AppState, caller: Uuid, order_id: Uuid) -> Result<OrderView> {
  with_deadline(state.config.request_timeout, "get_order", async {
    let mut tx = state.store.begin().await?;
    let order = tx
      .find_order(caller, order_id)
      .await?
      .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    let mut views = assemble_views(tx.as_mut(), vec![order]).await?;
    tx.commit().await?;
    views
      .pop()
      .ok_or_else(|| AppError::Internal("Order view assembly lost the order".to_string()))
  })
  .await
}

/// Loads items and addresses for `orders` with one query each and nests them. Orders without
/// an address or without items still render.
async fn assemble_views(tx: &mut dyn StoreTx, orders: Vec<Order>) -> Result<Vec<OrderView>> {
  if orders.is_empty() {
    return Ok(Vec::new());
  }
  let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
  let items = tx.order_items_for(&ids).await?;
  let addresses = tx.delivery_addresses_for(&ids).await?;

  let mut items_by_order: HashMap<Uuid, Vec<OrderItemView>> = HashMap::new();
  for item in items {
    items_by_order.entry(item.order_id).or_default().push(item);
  }
  let mut address_by_order: HashMap<Uuid, DeliveryAddress> = addresses.into_iter().map(|a| (a.order_id, a)).collect();

  Ok(
    orders
      .into_iter()
      .map(|order| {
        let id = order.id;
        OrderView::assemble(
          order,
          address_by_order.remove(&id),
          items_by_order.remove(&id).unwrap_or_default(),
        )
      })
      .collect(),
  )
}
