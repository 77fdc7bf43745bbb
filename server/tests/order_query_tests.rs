// tests/order_query_tests.rs
mod common;

use common::*;
use serial_test::serial;
use unisale_server::models::{Order, OrderStatus};
use unisale_server::services::{cart_service, checkout_service, order_service};
use unisale_server::AppError;
use uuid::Uuid;

async fn place_order(app: &TestApp, product_name: &str, price_cents: i64, quantity: i32) -> Order {
  let product = app.product(product_name, price_cents).await;
  cart_service::add_to_cart(&app.state, app.buyer.id, product.id, quantity).await.unwrap();
  checkout_service::create_order(&app.state, app.buyer.id, delivery_info()).await.unwrap()
}

#[tokio::test]
#[serial]
async fn test_orders_are_listed_newest_first_with_details() {
  let app = TestApp::new().await;
  let first = place_order(&app, "Sketchbook", 300, 1).await;
  let second = place_order(&app, "Easel", 2_500, 2).await;

  let orders = order_service::list_orders(&app.state, app.buyer.id).await.unwrap();

  assert_eq!(orders.iter().map(|o| o.id).collect::<Vec<_>>(), vec![second.id, first.id]);
  let easel = &orders[0];
  assert_eq!(easel.status, OrderStatus::Pending);
  assert_eq!(easel.total_amount_cents, 5_000);
  assert_eq!(easel.items.len(), 1);
  assert_eq!(easel.items[0].name.as_deref(), Some("Easel"));
  assert_eq!(easel.items[0].quantity, 2);
  assert!(easel.items[0].image_url.is_some());
  // Each order carries its own address, keyed by order id.
  assert_eq!(easel.delivery_address.as_ref().map(|a| a.order_id), Some(second.id));
  assert_eq!(orders[1].delivery_address.as_ref().map(|a| a.order_id), Some(first.id));
}

#[tokio::test]
#[serial]
async fn test_orders_of_other_users_are_not_listed() {
  let app = TestApp::new().await;
  place_order(&app, "Guitar", 9_000, 1).await;

  let orders = order_service::list_orders(&app.state, app.other.id).await.unwrap();

  assert!(orders.is_empty());
}

#[tokio::test]
#[serial]
async fn test_get_order_of_another_user_is_not_found() {
  let app = TestApp::new().await;
  let order = place_order(&app, "Monitor", 12_000, 1).await;

  let err = order_service::get_order(&app.state, app.other.id, order.id).await.unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);

  let err = order_service::get_order(&app.state, app.buyer.id, Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);

  let own = order_service::get_order(&app.state, app.buyer.id, order.id).await.unwrap();
  assert_eq!(own.id, order.id);
}

#[tokio::test]
#[serial]
async fn test_incomplete_orders_still_render() {
  let app = TestApp::new().await;
  let no_address = place_order(&app, "Router", 1_800, 1).await;
  let no_items = place_order(&app, "Cable", 200, 3).await;
  app.store.remove_delivery_address(no_address.id).await;
  app.store.remove_order_items(no_items.id).await;

  let orders = order_service::list_orders(&app.state, app.buyer.id).await.unwrap();
  assert_eq!(orders.len(), 2);

  let router = orders.iter().find(|o| o.id == no_address.id).unwrap();
  assert!(router.delivery_address.is_none());
  assert_eq!(router.items.len(), 1);

  let cable = order_service::get_order(&app.state, app.buyer.id, no_items.id).await.unwrap();
  assert!(cable.items.is_empty());
  assert!(cable.delivery_address.is_some());
  assert_eq!(cable.total_amount_cents, 600);
}

#[tokio::test]
#[serial]
async fn test_deleted_product_keeps_order_line() {
  let app = TestApp::new().await;
  let product = app.product("Microscope", 40_000).await;
  cart_service::add_to_cart(&app.state, app.buyer.id, product.id, 1).await.unwrap();
  let order = checkout_service::create_order(&app.state, app.buyer.id, delivery_info()).await.unwrap();

  app.store.delete_product(product.id).await;

  let view = order_service::get_order(&app.state, app.buyer.id, order.id).await.unwrap();
  assert_eq!(view.items.len(), 1);
  assert_eq!(view.items[0].product_id, None);
  assert_eq!(view.items[0].name, None);
  assert_eq!(view.items[0].price_cents, 40_000);
}
