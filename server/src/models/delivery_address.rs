// server/src/models/delivery_address.rs

use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DeliveryAddress {
  pub id: Uuid,
  pub order_id: Uuid,
  pub user_id: Uuid,
  pub full_name: String,
  pub phone: String,
  pub address: String,
  pub city: String,
  pub state: String,
  pub pincode: String,
  pub hostel_room: String,
}

/// Delivery details as submitted with a checkout request. Every field may be missing here;
/// `validate` decides what is acceptable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInfo {
  pub full_name: Option<String>,
  pub phone: Option<String>,
  pub address: Option<String>,
  pub city: Option<String>,
  pub state: Option<String>,
  pub pincode: Option<String>,
  pub hostel_room: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeliveryAddress {
  pub full_name: String,
  pub phone: String,
  pub address: String,
  pub city: String,
  pub state: String,
  pub pincode: String,
  pub hostel_room: String,
}

impl DeliveryInfo {
  /// Trims every field and requires all but `hostelRoom` to be present and non-blank.
  pub fn validate(&self) -> Result<NewDeliveryAddress, AppError> {
    let mut missing = Vec::new();
    let mut required = |value: &Option<String>, field: &'static str| -> String {
      match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
          missing.push(field);
          String::new()
        }
      }
    };

    let address = NewDeliveryAddress {
      full_name: required(&self.full_name, "fullName"),
      phone: required(&self.phone, "phone"),
      address: required(&self.address, "address"),
      city: required(&self.city, "city"),
      state: required(&self.state, "state"),
      pincode: required(&self.pincode, "pincode"),
      hostel_room: self.hostel_room.as_deref().map(str::trim).unwrap_or_default().to_string(),
    };

    if !missing.is_empty() {
      return Err(AppError::InvalidInput(format!(
        "Missing required delivery fields: {}",
        missing.join(", ")
      )));
    }
    Ok(address)
  }
}
