// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::Level;
use unisale_server::config::AppConfig;
use unisale_server::models::{DeliveryInfo, Product, User};
use unisale_server::services::identity::StaticTokenResolver;
use unisale_server::store::MemoryStore;
use unisale_server::AppState;

pub const BUYER_TOKEN: &str = "buyer-token";
pub const SELLER_TOKEN: &str = "seller-token";
pub const OTHER_TOKEN: &str = "other-token";

pub struct TestApp {
  pub store: MemoryStore,
  pub state: AppState,
  pub buyer: User,
  pub seller: User,
  pub other: User,
}

impl TestApp {
  pub async fn new() -> Self {
    Self::with_timeout_secs(5).await
  }

  pub async fn with_timeout_secs(secs: u64) -> Self {
    setup_tracing();
    let store = MemoryStore::new();
    let buyer = store.insert_user("Asha Buyer", "asha@campus.test").await;
    let seller = store.insert_user("Ravi Seller", "ravi@campus.test").await;
    let other = store.insert_user("Mei Other", "mei@campus.test").await;

    let timeout = secs.to_string();
    let config = AppConfig::from_lookup(|key| match key {
      "STORE_BACKEND" => Some("memory".to_string()),
      "AUTH_BACKEND" => Some("static".to_string()),
      "REQUEST_TIMEOUT_SECS" => Some(timeout.clone()),
      _ => None,
    })
    .expect("test config");

    let identity = StaticTokenResolver::default()
      .with_token(BUYER_TOKEN, buyer.id)
      .with_token(SELLER_TOKEN, seller.id)
      .with_token(OTHER_TOKEN, other.id);

    let state = AppState::new(Arc::new(store.clone()), Arc::new(identity), Arc::new(config));
    Self {
      store,
      state,
      buyer,
      seller,
      other,
    }
  }

  pub async fn product(&self, name: &str, price_cents: i64) -> Product {
    self.store.insert_product(self.seller.id, name, price_cents).await
  }
}

pub fn delivery_info() -> DeliveryInfo {
  DeliveryInfo {
    full_name: Some("Asha Buyer".to_string()),
    phone: Some("9876543210".to_string()),
    address: Some("Hostel Block C".to_string()),
    city: Some("Pune".to_string()),
    state: Some("Maharashtra".to_string()),
    pincode: Some("411007".to_string()),
    hostel_room: Some("C-214".to_string()),
  }
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
