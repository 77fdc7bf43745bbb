// tests/http_tests.rs
mod common;

use actix_web::http::header::AUTHORIZATION;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use common::*;
use serde_json::{json, Value};
use serial_test::serial;
use unisale_server::web::configure_app_routes;

macro_rules! init_app {
  ($test_app:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($test_app.state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
  (AUTHORIZATION, format!("Bearer {}", token))
}

fn checkout_body() -> Value {
  json!({
    "fullName": "Asha Buyer",
    "phone": "9876543210",
    "address": "Hostel Block C",
    "city": "Pune",
    "state": "Maharashtra",
    "pincode": "411007"
  })
}

#[actix_web::test]
#[serial]
async fn test_welcome_and_health() {
  let app = TestApp::new().await;
  let svc = init_app!(app);

  let body: Value = test::call_and_read_body_json(&svc, test::TestRequest::get().uri("/").to_request()).await;
  assert_eq!(body, json!({ "message": "Welcome to UniSale API!" }));

  let body: Value = test::call_and_read_body_json(&svc, test::TestRequest::get().uri("/health").to_request()).await;
  assert_eq!(body, json!({ "status": "ok", "store": "memory" }));
}

#[actix_web::test]
#[serial]
async fn test_requests_without_valid_token_are_unauthenticated() {
  let app = TestApp::new().await;
  let svc = init_app!(app);

  let resp = test::call_service(&svc, test::TestRequest::get().uri("/api/cart").to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["error"].is_string());

  let req = test::TestRequest::get()
    .uri("/api/orders")
    .insert_header(bearer("forged"))
    .to_request();
  let resp = test::call_service(&svc, req).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  // The credential is checked before the body is parsed.
  let bad_bodies = [
    ("/api/checkout", json!({ "fullName": 5 })),
    ("/api/cart/add", json!({})),
    ("/api/cart/remove", json!({ "productId": "not-a-uuid" })),
  ];
  for (uri, body) in bad_bodies {
    let req = test::TestRequest::post().uri(uri).set_json(body).to_request();
    let resp = test::call_service(&svc, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
  }
}

#[actix_web::test]
#[serial]
async fn test_cart_add_list_remove_over_http() {
  let app = TestApp::new().await;
  let lamp = app.product("Desk Lamp", 450).await;
  let svc = init_app!(app);

  // quantity defaults to 1
  let req = test::TestRequest::post()
    .uri("/api/cart/add")
    .insert_header(bearer(BUYER_TOKEN))
    .set_json(json!({ "productId": lamp.id }))
    .to_request();
  let resp = test::call_service(&svc, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["cartItem"]["quantity"], 1);

  let req = test::TestRequest::post()
    .uri("/api/cart/add")
    .insert_header(bearer(BUYER_TOKEN))
    .set_json(json!({ "productId": lamp.id, "quantity": 2 }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&svc, req).await;
  assert_eq!(body["cartItem"]["quantity"], 3);

  let req = test::TestRequest::get()
    .uri("/api/cart")
    .insert_header(bearer(BUYER_TOKEN))
    .to_request();
  let body: Value = test::call_and_read_body_json(&svc, req).await;
  let lines = body.as_array().expect("cart is a JSON array");
  assert_eq!(lines.len(), 1);
  assert_eq!(lines[0]["name"], "Desk Lamp");
  assert_eq!(lines[0]["quantity"], 3);
  assert_eq!(lines[0]["line_total_cents"], 1_350);
  assert_eq!(lines[0]["seller_name"], "Ravi Seller");

  let req = test::TestRequest::post()
    .uri("/api/cart/remove")
    .insert_header(bearer(BUYER_TOKEN))
    .set_json(json!({ "productId": lamp.id }))
    .to_request();
  let resp = test::call_service(&svc, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(app.store.cart_quantity(app.buyer.id, lamp.id).await, None);
}

#[actix_web::test]
#[serial]
async fn test_cart_errors_map_to_status_codes() {
  let app = TestApp::new().await;
  let lamp = app.product("Desk Lamp", 450).await;
  let svc = init_app!(app);

  let req = test::TestRequest::post()
    .uri("/api/cart/add")
    .insert_header(bearer(SELLER_TOKEN))
    .set_json(json!({ "productId": lamp.id }))
    .to_request();
  assert_eq!(test::call_service(&svc, req).await.status(), StatusCode::FORBIDDEN);

  let req = test::TestRequest::post()
    .uri("/api/cart/add")
    .insert_header(bearer(BUYER_TOKEN))
    .set_json(json!({ "productId": uuid::Uuid::new_v4() }))
    .to_request();
  assert_eq!(test::call_service(&svc, req).await.status(), StatusCode::NOT_FOUND);

  let req = test::TestRequest::post()
    .uri("/api/cart/add")
    .insert_header(bearer(BUYER_TOKEN))
    .set_json(json!({ "productId": lamp.id, "quantity": 0 }))
    .to_request();
  assert_eq!(test::call_service(&svc, req).await.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::post()
    .uri("/api/cart/add")
    .insert_header(bearer(BUYER_TOKEN))
    .set_json(json!({ "productId": "not-a-uuid" }))
    .to_request();
  let resp = test::call_service(&svc, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["error"].as_str().unwrap_or_default().starts_with("Invalid request body"));
}

#[actix_web::test]
#[serial]
async fn test_checkout_and_order_endpoints() {
  let app = TestApp::new().await;
  let a = app.product("Product A", 100).await;
  let b = app.product("Product B", 50).await;
  let svc = init_app!(app);

  for (id, qty) in [(a.id, 2), (b.id, 1)] {
    let req = test::TestRequest::post()
      .uri("/api/cart/add")
      .insert_header(bearer(BUYER_TOKEN))
      .set_json(json!({ "productId": id, "quantity": qty }))
      .to_request();
    assert_eq!(test::call_service(&svc, req).await.status(), StatusCode::OK);
  }

  let req = test::TestRequest::post()
    .uri("/api/checkout")
    .insert_header(bearer(BUYER_TOKEN))
    .set_json(checkout_body())
    .to_request();
  let resp = test::call_service(&svc, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "Order placed successfully");
  let order_id = body["order_id"].as_str().expect("order_id").to_string();

  let req = test::TestRequest::get()
    .uri(&format!("/api/orders/{}", order_id))
    .insert_header(bearer(BUYER_TOKEN))
    .to_request();
  let order: Value = test::call_and_read_body_json(&svc, req).await;
  assert_eq!(order["total_amount_cents"], 250);
  assert_eq!(order["status"], "pending");
  assert_eq!(order["items"].as_array().map(|i| i.len()), Some(2));
  assert_eq!(order["delivery_address"]["city"], "Pune");
  assert_eq!(order["delivery_address"]["hostel_room"], "");

  let req = test::TestRequest::get()
    .uri("/api/orders")
    .insert_header(bearer(BUYER_TOKEN))
    .to_request();
  let orders: Value = test::call_and_read_body_json(&svc, req).await;
  assert_eq!(orders.as_array().map(|o| o.len()), Some(1));

  // Someone else's order looks exactly like a missing one.
  let req = test::TestRequest::get()
    .uri(&format!("/api/orders/{}", order_id))
    .insert_header(bearer(OTHER_TOKEN))
    .to_request();
  assert_eq!(test::call_service(&svc, req).await.status(), StatusCode::NOT_FOUND);

  let req = test::TestRequest::get()
    .uri("/api/orders/not-a-uuid")
    .insert_header(bearer(BUYER_TOKEN))
    .to_request();
  assert_eq!(test::call_service(&svc, req).await.status(), StatusCode::NOT_FOUND);

  // The cart was consumed by the first checkout.
  let req = test::TestRequest::post()
    .uri("/api/checkout")
    .insert_header(bearer(BUYER_TOKEN))
    .set_json(checkout_body())
    .to_request();
  let resp = test::call_service(&svc, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body, json!({ "error": "Cart is empty" }));
}

#[actix_web::test]
#[serial]
async fn test_checkout_with_missing_fields_is_bad_request() {
  let app = TestApp::new().await;
  let a = app.product("Product A", 100).await;
  let svc = init_app!(app);

  let req = test::TestRequest::post()
    .uri("/api/cart/add")
    .insert_header(bearer(BUYER_TOKEN))
    .set_json(json!({ "productId": a.id }))
    .to_request();
  test::call_service(&svc, req).await;

  let req = test::TestRequest::post()
    .uri("/api/checkout")
    .insert_header(bearer(BUYER_TOKEN))
    .set_json(json!({ "fullName": "Asha Buyer" }))
    .to_request();
  let resp = test::call_service(&svc, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["error"].as_str().unwrap_or_default().contains("phone"));
  assert_eq!(app.store.counts().await.orders, 0);
  assert_eq!(app.store.cart_quantity(app.buyer.id, a.id).await, Some(1));
}
