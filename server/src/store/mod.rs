// server/src/store/mod.rs

//! Transactional access to the marketplace tables.
//!
//! Every operation runs inside a `StoreTx` obtained from `Store::begin`. Dropping a transaction
//! without calling `commit` rolls it back, on every exit path: errors, early returns, and futures
//! cancelled by a timeout.

pub mod memory;
pub mod postgres;

use crate::errors::Result;
use crate::models::{
  CartItem, CartLine, CheckoutLine, DeliveryAddress, NewDeliveryAddress, Order, OrderItem, OrderItemView, Product,
};
use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
  /// Short backend name reported by the health endpoint.
  fn backend_name(&self) -> &'static str;

  async fn begin(&self) -> Result<Box<dyn StoreTx>>;
}

#[async_trait]
pub trait StoreTx: Send {
  async fn find_product(&mut self, product_id: Uuid) -> Result<Option<Product>>;

  /// Inserts the (user, product) row or adds `delta` to its quantity in a single statement.
  /// A sum past `i32::MAX` fails with `InvalidInput` and leaves the row unchanged.
  async fn upsert_cart_line(&mut self, user_id: Uuid, product_id: Uuid, delta: i32) -> Result<CartItem>;

  /// Returns the number of rows removed (0 or 1).
  async fn delete_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> Result<u64>;

  /// Cart rows joined with product and seller. Rows whose product no longer exists are left out.
  /// A line whose total does not fit in `i64` is listed with `line_total_cents: None`.
  async fn cart_lines(&mut self, user_id: Uuid) -> Result<Vec<CartLine>>;

  /// Cart rows with current product price, locked until the transaction ends.
  async fn lock_cart_for_checkout(&mut self, user_id: Uuid) -> Result<Vec<CheckoutLine>>;

  async fn insert_order(&mut self, user_id: Uuid, total_amount_cents: i64) -> Result<Order>;

  async fn insert_delivery_address(
    &mut self,
    order_id: Uuid,
    user_id: Uuid,
    address: &NewDeliveryAddress,
  ) -> Result<DeliveryAddress>;

  async fn insert_order_item(&mut self, order_id: Uuid, line_no: i32, line: &CheckoutLine) -> Result<OrderItem>;

  /// Deletes the cart rows of `user_id` for `product_ids`, returning how many were removed.
  /// Rows added after the checkout snapshot was taken are left in place.
  async fn clear_cart(&mut self, user_id: Uuid, product_ids: &[Uuid]) -> Result<u64>;

  /// Orders of `user_id`, newest first.
  async fn orders_for_user(&mut self, user_id: Uuid) -> Result<Vec<Order>>;

  /// The order only if it belongs to `user_id`.
  async fn find_order(&mut self, user_id: Uuid, order_id: Uuid) -> Result<Option<Order>>;

  async fn order_items_for(&mut self, order_ids: &[Uuid]) -> Result<Vec<OrderItemView>>;

  async fn delivery_addresses_for(&mut self, order_ids: &[Uuid]) -> Result<Vec<DeliveryAddress>>;

  async fn commit(self: Box<Self>) -> Result<()>;
}
