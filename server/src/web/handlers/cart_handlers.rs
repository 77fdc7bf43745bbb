// server/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::cart_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

fn default_quantity() -> i32 {
  1
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequestPayload {
  pub product_id: Uuid,
  #[serde(default = "default_quantity")]
  pub quantity: i32,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartRequestPayload {
  pub product_id: Uuid,
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, req_payload, auth_user),
  fields(user_id = %auth_user.user_id, product_id = %req_payload.product_id, quantity = req_payload.quantity)
)]
pub async fn add_to_cart_handler(
  auth_user: AuthenticatedUser,
  app_state: web::Data<AppState>,
  req_payload: web::Json<AddToCartRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let item = cart_service::add_to_cart(
    &app_state,
    auth_user.user_id,
    req_payload.product_id,
    req_payload.quantity,
  )
  .await?;
  info!(quantity = item.quantity, "Item added to cart.");
  Ok(HttpResponse::Ok().json(json!({
    "message": "Item added to cart",
    "cartItem": item,
  })))
}

#[instrument(
  name = "handler::remove_from_cart",
  skip(app_state, req_payload, auth_user),
  fields(user_id = %auth_user.user_id, product_id = %req_payload.product_id)
)]
pub async fn remove_from_cart_handler(
  auth_user: AuthenticatedUser,
  app_state: web::Data<AppState>,
  req_payload: web::Json<RemoveFromCartRequestPayload>,
) -> Result<HttpResponse, AppError> {
  cart_service::remove_from_cart(&app_state, auth_user.user_id, req_payload.product_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Item removed from cart" })))
}

#[instrument(name = "handler::list_cart", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let lines = cart_service::list_cart(&app_state, auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(lines))
}
