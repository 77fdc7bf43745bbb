// server/src/web/routes.rs

use actix_web::{error, web, HttpResponse};
use serde_json::json;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::handlers::{cart_handlers, checkout_handlers, order_handlers};

async fn welcome_handler() -> HttpResponse {
  HttpResponse::Ok().json(json!({ "message": "Welcome to UniSale API!" }))
}

async fn health_check_handler(app_state: web::Data<AppState>) -> HttpResponse {
  HttpResponse::Ok().json(json!({ "status": "ok", "store": app_state.store.backend_name() }))
}

/// Malformed bodies and path ids are reported through `AppError` like every other failure.
fn json_config() -> web::JsonConfig {
  web::JsonConfig::default().error_handler(|err, _req| {
    let message = match &err {
      error::JsonPayloadError::ContentType => "Expected a JSON request body".to_string(),
      other => format!("Invalid request body: {}", other),
    };
    AppError::InvalidInput(message).into()
  })
}

fn path_config() -> web::PathConfig {
  web::PathConfig::default().error_handler(|_err, _req| AppError::NotFound("Resource not found".to_string()).into())
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(json_config())
    .app_data(path_config())
    .route("/", web::get().to(welcome_handler))
    .route("/health", web::get().to(health_check_handler))
    .service(
      web::scope("/api")
        .service(
          web::scope("/cart")
            .route("", web::get().to(cart_handlers::list_cart_handler))
            .route("/add", web::post().to(cart_handlers::add_to_cart_handler))
            .route("/remove", web::post().to(cart_handlers::remove_from_cart_handler)),
        )
        .route("/checkout", web::post().to(checkout_handlers::checkout_handler))
        .service(
          web::scope("/orders")
            .route("", web::get().to(order_handlers::list_orders_handler))
            .route("/{order_id}", web::get().to(order_handlers::get_order_handler)),
        ),
    );
}
