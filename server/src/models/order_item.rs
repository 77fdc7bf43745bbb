// server/src/models/order_item.rs

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Immutable order line. `price_cents` is the price copied at checkout.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  /// `None` once the product has been deleted.
  pub product_id: Option<Uuid>,
  pub line_no: i32,
  pub quantity: i32,
  pub price_cents: i64,
}

/// Order line joined with whatever is left of its product.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItemView {
  pub id: Uuid,
  #[serde(skip_serializing)]
  pub order_id: Uuid,
  pub product_id: Option<Uuid>,
  pub name: Option<String>,
  pub image_url: Option<String>,
  pub quantity: i32,
  pub price_cents: i64,
}
