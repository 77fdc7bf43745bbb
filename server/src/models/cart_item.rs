// server/src/models/cart_item.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

/// A row of the `cart` table. One per (user, product).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartItem {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub added_at: DateTime<Utc>,
}

/// Cart row joined with its product and seller, as listed to the buyer.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartLine {
  pub product_id: Uuid,
  pub name: String,
  pub price_cents: i64,
  pub image_url: Option<String>,
  pub quantity: i32,
  pub seller_id: Uuid,
  pub seller_name: Option<String>,
  /// `None` when `price_cents * quantity` does not fit in `i64`.
  #[sqlx(default)]
  pub line_total_cents: Option<i64>,
}

impl CartLine {
  /// Fills in `line_total_cents`. An overflowing line is kept and flagged rather than failing
  /// the whole listing.
  pub fn with_line_total(mut self) -> Self {
    self.line_total_cents = self.price_cents.checked_mul(i64::from(self.quantity));
    if self.line_total_cents.is_none() {
      warn!(product_id = %self.product_id, quantity = self.quantity, "Cart line total overflows; listed without a total.");
    }
    self
  }
}

/// Cart row with the product price read inside the checkout transaction.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CheckoutLine {
  pub product_id: Uuid,
  pub name: String,
  pub price_cents: i64,
  pub quantity: i32,
}

impl CheckoutLine {
  pub fn line_total_cents(&self) -> Option<i64> {
    self.price_cents.checked_mul(i64::from(self.quantity))
  }
}
