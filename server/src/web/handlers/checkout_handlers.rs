// server/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::models::DeliveryInfo;
use crate::services::checkout_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::checkout", skip(app_state, req_payload, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn checkout_handler(
  auth_user: AuthenticatedUser,
  app_state: web::Data<AppState>,
  req_payload: web::Json<DeliveryInfo>,
) -> Result<HttpResponse, AppError> {
  let order = checkout_service::create_order(&app_state, auth_user.user_id, req_payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(json!({
    "order_id": order.id,
    "message": "Order placed successfully",
  })))
}
