// server/src/models/order.rs

use crate::models::{DeliveryAddress, OrderItemView};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Shipped,
  Delivered,
  Cancelled,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub total_amount_cents: i64,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// An order with its delivery address and items, as returned by the order endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
  pub id: Uuid,
  pub user_id: Uuid,
  pub total_amount_cents: i64,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub delivery_address: Option<DeliveryAddress>,
  pub items: Vec<OrderItemView>,
}

impl OrderView {
  pub fn assemble(order: Order, delivery_address: Option<DeliveryAddress>, items: Vec<OrderItemView>) -> Self {
    Self {
      id: order.id,
      user_id: order.user_id,
      total_amount_cents: order.total_amount_cents,
      status: order.status,
      created_at: order.created_at,
      updated_at: order.updated_at,
      delivery_address,
      items,
    }
  }
}
