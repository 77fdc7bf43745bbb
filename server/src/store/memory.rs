// server/src/store/memory.rs

//! In-process store used by the test-suite and `STORE_BACKEND=memory`.
//!
//! A transaction takes an exclusive lock on all tables and edits a staged copy of them.
//! `commit` publishes the copy; dropping the transaction discards it. Transactions are therefore
//! fully serialized, which is stricter than the row locks taken by the Postgres store.
//!
//! The test helpers on `MemoryStore` (`set_product_price`, `delete_product`, `counts`, ...) take
//! the same table lock. Calling one while a `MemoryStoreTx` is alive in the same task deadlocks.

use crate::errors::{AppError, Result};
use crate::models::{
  CartItem, CartLine, CheckoutLine, DeliveryAddress, NewDeliveryAddress, Order, OrderItem, OrderItemView, OrderStatus,
  Product, User,
};
use crate::store::{Store, StoreTx};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

/// Operation at which an armed transaction fails with `StoreFailure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
  InsertOrder,
  InsertDeliveryAddress,
  InsertOrderItem,
  ClearCart,
  Commit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
  pub cart_rows: usize,
  pub orders: usize,
  pub order_items: usize,
  pub delivery_addresses: usize,
}

#[derive(Debug, Clone, Default)]
struct Tables {
  users: HashMap<Uuid, User>,
  products: HashMap<Uuid, Product>,
  cart: Vec<CartItem>,
  orders: Vec<Order>,
  order_items: Vec<OrderItem>,
  delivery_addresses: Vec<DeliveryAddress>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
  tables: Arc<Mutex<Tables>>,
  armed_failure: Arc<Mutex<Option<FailPoint>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn insert_user(&self, name: &str, email: &str) -> User {
    let user = User {
      id: Uuid::new_v4(),
      name: name.to_string(),
      email: email.to_string(),
      created_at: Utc::now(),
    };
    self.tables.lock().await.users.insert(user.id, user.clone());
    user
  }

  pub async fn insert_product(&self, seller_id: Uuid, name: &str, price_cents: i64) -> Product {
    let now = Utc::now();
    let product = Product {
      id: Uuid::new_v4(),
      user_id: seller_id,
      name: name.to_string(),
      description: None,
      price_cents,
      image_url: Some(format!("https://img.unisale.test/{}.jpg", name.to_lowercase().replace(' ', "-"))),
      created_at: now,
      updated_at: now,
    };
    self.tables.lock().await.products.insert(product.id, product.clone());
    product
  }

  /// Returns `false` when the product does not exist. Waits for the table lock like `delete_product`.
  pub async fn set_product_price(&self, product_id: Uuid, price_cents: i64) -> bool {
    let mut tables = self.tables.lock().await;
    match tables.products.get_mut(&product_id) {
      Some(product) => {
        product.price_cents = price_cents;
        product.updated_at = Utc::now();
        true
      }
      None => false,
    }
  }

  /// Deletes a product the way the schema does: cart rows keep their dangling id and order
  /// items lose their product reference.
  ///
  /// Waits for the table lock, so it must not be awaited while a transaction is open in the same task.
  pub async fn delete_product(&self, product_id: Uuid) -> bool {
    let mut tables = self.tables.lock().await;
    if tables.products.remove(&product_id).is_none() {
      return false;
    }
    for item in tables.order_items.iter_mut().filter(|i| i.product_id == Some(product_id)) {
      item.product_id = None;
    }
    true
  }

  pub async fn remove_delivery_address(&self, order_id: Uuid) {
    self.tables.lock().await.delivery_addresses.retain(|a| a.order_id != order_id);
  }

  pub async fn remove_order_items(&self, order_id: Uuid) {
    self.tables.lock().await.order_items.retain(|i| i.order_id != order_id);
  }

  /// The next transaction to begin fails when it reaches `point`.
  pub async fn fail_next_transaction_at(&self, point: FailPoint) {
    *self.armed_failure.lock().await = Some(point);
  }

  pub async fn counts(&self) -> TableCounts {
    let tables = self.tables.lock().await;
    TableCounts {
      cart_rows: tables.cart.len(),
      orders: tables.orders.len(),
      order_items: tables.order_items.len(),
      delivery_addresses: tables.delivery_addresses.len(),
    }
  }

  pub async fn cart_quantity(&self, user_id: Uuid, product_id: Uuid) -> Option<i32> {
    let tables = self.tables.lock().await;
    tables
      .cart
      .iter()
      .find(|c| c.user_id == user_id && c.product_id == product_id)
      .map(|c| c.quantity)
  }
}

#[async_trait]
impl Store for MemoryStore {
  fn backend_name(&self) -> &'static str {
    "memory"
  }

  async fn begin(&self) -> Result<Box<dyn StoreTx>> {
    let guard = self.tables.clone().lock_owned().await;
    let staged = guard.clone();
    let fail_at = self.armed_failure.lock().await.take();
    debug!(armed_failure = ?fail_at, "Memory transaction opened.");
    Ok(Box::new(MemoryStoreTx { guard, staged, fail_at }))
  }
}

pub struct MemoryStoreTx {
  guard: OwnedMutexGuard<Tables>,
  staged: Tables,
  fail_at: Option<FailPoint>,
}

impl MemoryStoreTx {
  fn check(&self, point: FailPoint) -> Result<()> {
    if self.fail_at == Some(point) {
      warn!(?point, "Injected store failure.");
      return Err(AppError::StoreFailure(format!("injected failure at {:?}", point)));
    }
    Ok(())
  }
}

#[async_trait]
impl StoreTx for MemoryStoreTx {
  async fn find_product(&mut self, product_id: Uuid) -> Result<Option<Product>> {
    Ok(self.staged.products.get(&product_id).cloned())
  }

  async fn upsert_cart_line(&mut self, user_id: Uuid, product_id: Uuid, delta: i32) -> Result<CartItem> {
    if let Some(existing) = self
      .staged
      .cart
      .iter_mut()
      .find(|c| c.user_id == user_id && c.product_id == product_id)
    {
      existing.quantity = existing
        .quantity
        .checked_add(delta)
        .ok_or_else(|| AppError::InvalidInput("Cart quantity is too large".to_string()))?;
      return Ok(existing.clone());
    }
    let item = CartItem {
      id: Uuid::new_v4(),
      user_id,
      product_id,
      quantity: delta,
      added_at: Utc::now(),
    };
    self.staged.cart.push(item.clone());
    Ok(item)
  }

  async fn delete_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> Result<u64> {
    let before = self.staged.cart.len();
    self
      .staged
      .cart
      .retain(|c| !(c.user_id == user_id && c.product_id == product_id));
    Ok((before - self.staged.cart.len()) as u64)
  }

  async fn cart_lines(&mut self, user_id: Uuid) -> Result<Vec<CartLine>> {
    let tables = &self.staged;
    let mut rows: Vec<(&CartItem, &Product)> = tables
      .cart
      .iter()
      .filter(|c| c.user_id == user_id)
      .filter_map(|c| tables.products.get(&c.product_id).map(|p| (c, p)))
      .collect();
    rows.sort_by_key(|(c, _)| (c.added_at, c.product_id));

    Ok(
      rows
        .into_iter()
        .map(|(c, p)| {
          CartLine {
            product_id: c.product_id,
            name: p.name.clone(),
            price_cents: p.price_cents,
            image_url: p.image_url.clone(),
            quantity: c.quantity,
            seller_id: p.user_id,
            seller_name: tables.users.get(&p.user_id).map(|u| u.name.clone()),
            line_total_cents: None,
          }
          .with_line_total()
        })
        .collect(),
    )
  }

  async fn lock_cart_for_checkout(&mut self, user_id: Uuid) -> Result<Vec<CheckoutLine>> {
    let tables = &self.staged;
    let mut rows: Vec<(&CartItem, &Product)> = tables
      .cart
      .iter()
      .filter(|c| c.user_id == user_id)
      .filter_map(|c| tables.products.get(&c.product_id).map(|p| (c, p)))
      .collect();
    rows.sort_by_key(|(c, _)| (c.added_at, c.product_id));

    Ok(
      rows
        .into_iter()
        .map(|(c, p)| CheckoutLine {
          product_id: c.product_id,
          name: p.name.clone(),
          price_cents: p.price_cents,
          quantity: c.quantity,
        })
        .collect(),
    )
  }

  async fn insert_order(&mut self, user_id: Uuid, total_amount_cents: i64) -> Result<Order> {
    self.check(FailPoint::InsertOrder)?;
    let now = Utc::now();
    let order = Order {
      id: Uuid::new_v4(),
      user_id,
      total_amount_cents,
      status: OrderStatus::Pending,
      created_at: now,
      updated_at: now,
    };
    self.staged.orders.push(order.clone());
    Ok(order)
  }

  async fn insert_delivery_address(
    &mut self,
    order_id: Uuid,
    user_id: Uuid,
    address: &NewDeliveryAddress,
  ) -> Result<DeliveryAddress> {
    self.check(FailPoint::InsertDeliveryAddress)?;
    if self.staged.delivery_addresses.iter().any(|a| a.order_id == order_id) {
      return Err(AppError::StoreFailure(format!(
        "order {} already has a delivery address",
        order_id
      )));
    }
    let row = DeliveryAddress {
      id: Uuid::new_v4(),
      order_id,
      user_id,
      full_name: address.full_name.clone(),
      phone: address.phone.clone(),
      address: address.address.clone(),
      city: address.city.clone(),
      state: address.state.clone(),
      pincode: address.pincode.clone(),
      hostel_room: address.hostel_room.clone(),
    };
    self.staged.delivery_addresses.push(row.clone());
    Ok(row)
  }

  async fn insert_order_item(&mut self, order_id: Uuid, line_no: i32, line: &CheckoutLine) -> Result<OrderItem> {
    self.check(FailPoint::InsertOrderItem)?;
    let item = OrderItem {
      id: Uuid::new_v4(),
      order_id,
      product_id: Some(line.product_id),
      line_no,
      quantity: line.quantity,
      price_cents: line.price_cents,
    };
    self.staged.order_items.push(item.clone());
    Ok(item)
  }

  async fn clear_cart(&mut self, user_id: Uuid, product_ids: &[Uuid]) -> Result<u64> {
    self.check(FailPoint::ClearCart)?;
    let before = self.staged.cart.len();
    self
      .staged
      .cart
      .retain(|c| !(c.user_id == user_id && product_ids.contains(&c.product_id)));
    Ok((before - self.staged.cart.len()) as u64)
  }

  async fn orders_for_user(&mut self, user_id: Uuid) -> Result<Vec<Order>> {
    // Later inserts come first among equal timestamps.
    let mut orders: Vec<Order> = self
      .staged
      .orders
      .iter()
      .rev()
      .filter(|o| o.user_id == user_id)
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }

  async fn find_order(&mut self, user_id: Uuid, order_id: Uuid) -> Result<Option<Order>> {
    Ok(
      self
        .staged
        .orders
        .iter()
        .find(|o| o.id == order_id && o.user_id == user_id)
        .cloned(),
    )
  }

  async fn order_items_for(&mut self, order_ids: &[Uuid]) -> Result<Vec<OrderItemView>> {
    let tables = &self.staged;
    let mut items: Vec<&OrderItem> = tables
      .order_items
      .iter()
      .filter(|i| order_ids.contains(&i.order_id))
      .collect();
    items.sort_by_key(|i| (i.order_id, i.line_no));

    Ok(
      items
        .into_iter()
        .map(|i| {
          let product = i.product_id.and_then(|id| tables.products.get(&id));
          OrderItemView {
            id: i.id,
            order_id: i.order_id,
            product_id: i.product_id,
            name: product.map(|p| p.name.clone()),
            image_url: product.and_then(|p| p.image_url.clone()),
            quantity: i.quantity,
            price_cents: i.price_cents,
          }
        })
        .collect(),
    )
  }

  async fn delivery_addresses_for(&mut self, order_ids: &[Uuid]) -> Result<Vec<DeliveryAddress>> {
    Ok(
      self
        .staged
        .delivery_addresses
        .iter()
        .filter(|a| order_ids.contains(&a.order_id))
        .cloned()
        .collect(),
    )
  }

  async fn commit(self: Box<Self>) -> Result<()> {
    self.check(FailPoint::Commit)?;
    let MemoryStoreTx { mut guard, staged, .. } = *self;
    *guard = staged;
    debug!("Memory transaction committed.");
    Ok(())
  }
}
