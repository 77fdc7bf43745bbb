// server/src/pipelines/contexts.rs

//! Context structs the pipelines run over. Each one carries the request inputs, the open store
//! transaction and the values produced by the steps.

use crate::errors::{AppError, Result};
use crate::models::{CartItem, CheckoutLine, DeliveryInfo, NewDeliveryAddress, Order, Product};
use crate::store::{Store, StoreTx};
use std::sync::Arc;
use uuid::Uuid;

/// Contexts that own a store transaction for the length of a pipeline run.
pub trait TransactionalCtx: Send + 'static {
  fn store(&self) -> &Arc<dyn Store>;
  fn tx_slot(&mut self) -> &mut Option<Box<dyn StoreTx>>;
}

/// The open transaction held in `slot`. Taking the field rather than the whole context lets a
/// step read other context fields while the transaction is borrowed.
pub fn open_tx(slot: &mut Option<Box<dyn StoreTx>>) -> Result<&mut dyn StoreTx> {
  match slot {
    Some(tx) => Ok(tx.as_mut()),
    None => Err(AppError::Internal("No open store transaction in pipeline context".to_string())),
  }
}

pub struct AddToCartCtxData {
  pub store: Arc<dyn Store>,
  pub tx: Option<Box<dyn StoreTx>>,
  pub caller: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub product: Option<Product>,
  pub cart_item: Option<CartItem>,
}

impl AddToCartCtxData {
  pub fn new(store: Arc<dyn Store>, caller: Uuid, product_id: Uuid, quantity: i32) -> Self {
    Self {
      store,
      tx: None,
      caller,
      product_id,
      quantity,
      product: None,
      cart_item: None,
    }
  }
}

impl TransactionalCtx for AddToCartCtxData {
  fn store(&self) -> &Arc<dyn Store> {
    &self.store
  }

  fn tx_slot(&mut self) -> &mut Option<Box<dyn StoreTx>> {
    &mut self.tx
  }
}

pub struct CheckoutCtxData {
  pub store: Arc<dyn Store>,
  pub tx: Option<Box<dyn StoreTx>>,
  pub caller: Uuid,
  pub delivery_info: DeliveryInfo,
  pub delivery_address: Option<NewDeliveryAddress>,
  /// Cart lines with prices read under lock; the only price source for the order.
  pub lines: Vec<CheckoutLine>,
  pub total_amount_cents: i64,
  pub order: Option<Order>,
}

impl CheckoutCtxData {
  pub fn new(store: Arc<dyn Store>, caller: Uuid, delivery_info: DeliveryInfo) -> Self {
    Self {
      store,
      tx: None,
      caller,
      delivery_info,
      delivery_address: None,
      lines: Vec::new(),
      total_amount_cents: 0,
      order: None,
    }
  }
}

impl TransactionalCtx for CheckoutCtxData {
  fn store(&self) -> &Arc<dyn Store> {
    &self.store
  }

  fn tx_slot(&mut self) -> &mut Option<Box<dyn StoreTx>> {
    &mut self.tx
  }
}
