//! Serde types for backend payloads.
//!
//! Read models keep a flattened `extra` map so fields this client does not
//! model survive a round trip through the cache. Forms only carry what the
//! admin screens submit.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::session::SessionUser;

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
  #[serde(alias = "data", alias = "docs", default = "Vec::new")]
  pub items: Vec<T>,
  #[serde(alias = "totalCount", alias = "totalDocs", default)]
  pub total: u64,
  #[serde(default)]
  pub page: u32,
  #[serde(default)]
  pub limit: u32,
}

impl<T> Page<T> {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
  pub email: String,
  pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
  #[serde(alias = "accessToken")]
  pub token: String,
  pub user: SessionUser,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
  pub name: String,
  pub email: String,
  pub password: String,
  pub shop_name: String,
  pub vertical: Vertical,
}

/// Business line a shop operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Vertical {
  Retail,
  FoodMart,
  Hotel,
  RealEstate,
}

/// Token returned by the first step of a multi-step flow.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowToken {
  #[serde(alias = "activationToken", alias = "resetToken")]
  pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OtpVerification {
  pub token: String,
  pub otp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtpResend {
  pub email: String,
  pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailAddress {
  pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordReset {
  pub token: String,
  pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
  pub current_password: String,
  pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  #[serde(alias = "_id")]
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub role: String,
  #[serde(default)]
  pub shop_name: Option<String>,
  #[serde(flatten)]
  pub extra: HashMap<String, Value>,
}

// ============================================================================
// Products
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  #[serde(alias = "_id")]
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub price: f64,
  #[serde(default)]
  pub stock: Option<i64>,
  #[serde(default)]
  pub category: Option<String>,
  #[serde(default)]
  pub images: Vec<String>,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(flatten)]
  pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
  pub name: String,
  pub price: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stock: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Category {
  #[serde(alias = "_id")]
  pub id: String,
  pub name: String,
}

// ============================================================================
// Bookings and reservations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
  #[serde(alias = "_id")]
  pub id: String,
  #[serde(default)]
  pub customer_name: Option<String>,
  #[serde(default)]
  pub check_in: Option<String>,
  #[serde(default)]
  pub check_out: Option<String>,
  #[serde(default)]
  pub status: String,
  #[serde(default)]
  pub total: f64,
  #[serde(flatten)]
  pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
  Pending,
  Confirmed,
  Completed,
  Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate<S> {
  pub status: S,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
  #[serde(alias = "_id")]
  pub id: String,
  #[serde(default)]
  pub customer_name: Option<String>,
  #[serde(default)]
  pub date: Option<String>,
  #[serde(default)]
  pub guests: Option<u32>,
  #[serde(default)]
  pub status: String,
  #[serde(flatten)]
  pub extra: HashMap<String, Value>,
}

// ============================================================================
// Food mart
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
  #[serde(alias = "_id")]
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub price: f64,
  #[serde(default)]
  pub available: bool,
  #[serde(flatten)]
  pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemForm {
  pub name: String,
  pub price: f64,
  pub available: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodOrder {
  #[serde(alias = "_id")]
  pub id: String,
  #[serde(default)]
  pub status: String,
  #[serde(default)]
  pub total: f64,
  #[serde(flatten)]
  pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
  Pending,
  Preparing,
  Ready,
  Delivered,
  Cancelled,
}

// ============================================================================
// Offers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
  #[serde(alias = "_id")]
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub discount_percent: f64,
  #[serde(default)]
  pub expires_at: Option<String>,
  #[serde(flatten)]
  pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferForm {
  pub title: String,
  pub discount_percent: f64,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub product_ids: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub expires_at: Option<String>,
}

// ============================================================================
// Acquisitions (real-estate listings)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acquisition {
  #[serde(alias = "_id")]
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub price: f64,
  #[serde(default)]
  pub location: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(flatten)]
  pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquisitionForm {
  pub title: String,
  pub price: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

// ============================================================================
// Money
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
  #[serde(alias = "_id")]
  pub id: String,
  pub amount: f64,
  #[serde(default)]
  pub status: String,
  #[serde(default)]
  pub created_at: Option<String>,
  #[serde(flatten)]
  pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
  pub amount: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bank_account_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
  #[serde(default)]
  pub available: f64,
  #[serde(default)]
  pub pending: f64,
  #[serde(default)]
  pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
  #[serde(alias = "_id")]
  pub id: String,
  #[serde(default)]
  pub amount: f64,
  #[serde(default, rename = "type")]
  pub kind: String,
  #[serde(default)]
  pub reference: Option<String>,
  #[serde(default)]
  pub created_at: Option<String>,
  #[serde(flatten)]
  pub extra: HashMap<String, Value>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_page_accepts_data_alias() {
    let page: Page<Product> = serde_json::from_str(
      r#"{"data":[{"_id":"p1","name":"Lamp","price":12.5,"sku":"L-1"}],"totalCount":41,"page":1,"limit":20}"#,
    )
    .unwrap();

    assert_eq!(page.total, 41);
    assert_eq!(page.items[0].id, "p1");
    assert_eq!(page.items[0].extra.get("sku"), Some(&Value::from("L-1")));
  }

  #[test]
  fn test_product_form_skips_unset_fields() {
    let form = ProductForm {
      name: "Lamp".to_string(),
      price: 10.0,
      ..ProductForm::default()
    };
    assert_eq!(
      serde_json::to_value(&form).unwrap(),
      serde_json::json!({"name": "Lamp", "price": 10.0})
    );
  }

  #[test]
  fn test_signup_vertical_wire_names() {
    assert_eq!(
      serde_json::to_value(Vertical::FoodMart).unwrap(),
      Value::from("food-mart")
    );
  }
}
