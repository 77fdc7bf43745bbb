// server/src/store/postgres.rs

use crate::errors::{AppError, Result};
use crate::models::{
  CartItem, CartLine, CheckoutLine, DeliveryAddress, NewDeliveryAddress, Order, OrderItem, OrderItemView, OrderStatus,
  Product,
};
use crate::store::{Store, StoreTx};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, user_id, total_amount_cents, status, created_at, updated_at";
const ADDRESS_COLUMNS: &str = "id, order_id, user_id, full_name, phone, address, city, state, pincode, hostel_room";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }
}

#[async_trait]
impl Store for PgStore {
  fn backend_name(&self) -> &'static str {
    "postgres"
  }

  async fn begin(&self) -> Result<Box<dyn StoreTx>> {
    let tx = self.pool.begin().await?;
    debug!("Postgres transaction opened.");
    Ok(Box::new(PgStoreTx { tx }))
  }
}

/// Wraps a pooled `sqlx::Transaction`, which rolls back when dropped uncommitted.
pub struct PgStoreTx {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgStoreTx {
  async fn find_product(&mut self, product_id: Uuid) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
      "SELECT id, user_id, name, description, price_cents, image_url, created_at, updated_at \
       FROM products WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(&mut *self.tx)
    .await?;
    Ok(product)
  }

  async fn upsert_cart_line(&mut self, user_id: Uuid, product_id: Uuid, delta: i32) -> Result<CartItem> {
    // The WHERE guard turns an INTEGER overflow into "no row returned" instead of SQLSTATE 22003.
    let item = sqlx::query_as::<_, CartItem>(
      "INSERT INTO cart (id, user_id, product_id, quantity) VALUES ($1, $2, $3, $4) \
       ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = cart.quantity + EXCLUDED.quantity \
       WHERE cart.quantity <= 2147483647 - EXCLUDED.quantity \
       RETURNING id, user_id, product_id, quantity, added_at",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(product_id)
    .bind(delta)
    .fetch_optional(&mut *self.tx)
    .await?;
    item.ok_or_else(|| AppError::InvalidInput("Cart quantity is too large".to_string()))
  }

  async fn delete_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> Result<u64> {
    let res = sqlx::query("DELETE FROM cart WHERE user_id = $1 AND product_id = $2")
      .bind(user_id)
      .bind(product_id)
      .execute(&mut *self.tx)
      .await?;
    Ok(res.rows_affected())
  }

  async fn cart_lines(&mut self, user_id: Uuid) -> Result<Vec<CartLine>> {
    let lines = sqlx::query_as::<_, CartLine>(
      "SELECT c.product_id, p.name, p.price_cents, p.image_url, c.quantity, \
              p.user_id AS seller_id, u.name AS seller_name \
       FROM cart c \
       JOIN products p ON p.id = c.product_id \
       LEFT JOIN users u ON u.id = p.user_id \
       WHERE c.user_id = $1 \
       ORDER BY c.added_at, c.product_id",
    )
    .bind(user_id)
    .fetch_all(&mut *self.tx)
    .await?;
    Ok(lines.into_iter().map(CartLine::with_line_total).collect())
  }

  #[instrument(name = "pg::lock_cart_for_checkout", skip_all, fields(%user_id))]
  async fn lock_cart_for_checkout(&mut self, user_id: Uuid) -> Result<Vec<CheckoutLine>> {
    // A concurrent checkout of the same cart blocks here until this one ends, then sees the
    // rows it deleted as gone.
    let lines = sqlx::query_as::<_, CheckoutLine>(
      "SELECT c.product_id, p.name, p.price_cents, c.quantity \
       FROM cart c \
       JOIN products p ON p.id = c.product_id \
       WHERE c.user_id = $1 \
       ORDER BY c.added_at, c.product_id \
       FOR UPDATE OF c FOR SHARE OF p",
    )
    .bind(user_id)
    .fetch_all(&mut *self.tx)
    .await?;
    debug!(locked_rows = lines.len(), "Cart rows locked.");
    Ok(lines)
  }

  async fn insert_order(&mut self, user_id: Uuid, total_amount_cents: i64) -> Result<Order> {
    let sql = format!(
      "INSERT INTO orders (id, user_id, total_amount_cents, status) VALUES ($1, $2, $3, $4) RETURNING {}",
      ORDER_COLUMNS
    );
    let order = sqlx::query_as::<_, Order>(&sql)
      .bind(Uuid::new_v4())
      .bind(user_id)
      .bind(total_amount_cents)
      .bind(OrderStatus::Pending)
      .fetch_one(&mut *self.tx)
      .await?;
    Ok(order)
  }

  async fn insert_delivery_address(
    &mut self,
    order_id: Uuid,
    user_id: Uuid,
    address: &NewDeliveryAddress,
  ) -> Result<DeliveryAddress> {
    let sql = format!(
      "INSERT INTO delivery_addresses \
       (id, order_id, user_id, full_name, phone, address, city, state, pincode, hostel_room) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
      ADDRESS_COLUMNS
    );
    let row = sqlx::query_as::<_, DeliveryAddress>(&sql)
      .bind(Uuid::new_v4())
      .bind(order_id)
      .bind(user_id)
      .bind(&address.full_name)
      .bind(&address.phone)
      .bind(&address.address)
      .bind(&address.city)
      .bind(&address.state)
      .bind(&address.pincode)
      .bind(&address.hostel_room)
      .fetch_one(&mut *self.tx)
      .await?;
    Ok(row)
  }

  async fn insert_order_item(&mut self, order_id: Uuid, line_no: i32, line: &CheckoutLine) -> Result<OrderItem> {
    let item = sqlx::query_as::<_, OrderItem>(
      "INSERT INTO order_items (id, order_id, product_id, line_no, quantity, price_cents) \
       VALUES ($1, $2, $3, $4, $5, $6) \
       RETURNING id, order_id, product_id, line_no, quantity, price_cents",
    )
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(line.product_id)
    .bind(line_no)
    .bind(line.quantity)
    .bind(line.price_cents)
    .fetch_one(&mut *self.tx)
    .await?;
    Ok(item)
  }

  async fn clear_cart(&mut self, user_id: Uuid, product_ids: &[Uuid]) -> Result<u64> {
    let res = sqlx::query("DELETE FROM cart WHERE user_id = $1 AND product_id = ANY($2)")
      .bind(user_id)
      .bind(product_ids)
      .execute(&mut *self.tx)
      .await?;
    Ok(res.rows_affected())
  }

  async fn orders_for_user(&mut self, user_id: Uuid) -> Result<Vec<Order>> {
    let sql = format!(
      "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
      ORDER_COLUMNS
    );
    let orders = sqlx::query_as::<_, Order>(&sql)
      .bind(user_id)
      .fetch_all(&mut *self.tx)
      .await?;
    Ok(orders)
  }

  async fn find_order(&mut self, user_id: Uuid, order_id: Uuid) -> Result<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE id = $1 AND user_id = $2", ORDER_COLUMNS);
    let order = sqlx::query_as::<_, Order>(&sql)
      .bind(order_id)
      .bind(user_id)
      .fetch_optional(&mut *self.tx)
      .await?;
    Ok(order)
  }

  async fn order_items_for(&mut self, order_ids: &[Uuid]) -> Result<Vec<OrderItemView>> {
    let items = sqlx::query_as::<_, OrderItemView>(
      "SELECT oi.id, oi.order_id, oi.product_id, p.name, p.image_url, oi.quantity, oi.price_cents \
       FROM order_items oi \
       LEFT JOIN products p ON p.id = oi.product_id \
       WHERE oi.order_id = ANY($1) \
       ORDER BY oi.order_id, oi.line_no",
    )
    .bind(order_ids)
    .fetch_all(&mut *self.tx)
    .await?;
    Ok(items)
  }

  async fn delivery_addresses_for(&mut self, order_ids: &[Uuid]) -> Result<Vec<DeliveryAddress>> {
    let sql = format!("SELECT {} FROM delivery_addresses WHERE order_id = ANY($1)", ADDRESS_COLUMNS);
    let rows = sqlx::query_as::<_, DeliveryAddress>(&sql)
      .bind(order_ids)
      .fetch_all(&mut *self.tx)
      .await?;
    Ok(rows)
  }

  async fn commit(self: Box<Self>) -> Result<()> {
    self.tx.commit().await?;
    debug!("Postgres transaction committed.");
    Ok(())
  }
}
