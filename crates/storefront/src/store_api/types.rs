//! Wire types for the store backend API.
//!
//! Field names follow the backend's camelCase JSON.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rwaya_core::ShippingMethod;

// =============================================================================
// Checkout
// =============================================================================

/// `POST /checkout` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest<'a> {
    pub items: Vec<CheckoutItem<'a>>,
    pub customer_email: &'a str,
    pub phone: &'a str,
    pub address: &'a str,
    pub county: &'a str,
    pub customer_name: &'a str,
    pub id_number: &'a str,
    pub shipping_method: ShippingMethod,
}

#[derive(Debug, Serialize)]
pub struct CheckoutItem<'a> {
    pub id: &'a str,
    pub quantity: u32,
}

/// `POST /checkout` response body.
///
/// `{success: true, email, amount, reference}` or `{success: false, error}`.
#[derive(Debug, Deserialize)]
pub struct CheckoutResponse {
    pub success: bool,
    #[serde(default)]
    pub email: Option<String>,
    /// Minor currency units.
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Error body some non-2xx responses carry.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub success: Option<bool>,
    pub error: String,
}

// =============================================================================
// Tracking
// =============================================================================

/// `GET /orders/track` response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub county: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub tracking_id: Option<String>,
    pub delivery_status: String,
    pub is_paid: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub order_items: Vec<OrderItemResponse>,
    #[serde(default)]
    pub tracking_updates: Vec<TrackingUpdateResponse>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub quantity: u32,
    pub product: ProductResponse,
}

#[derive(Debug, Deserialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    /// Decimal, sent either as a JSON string or a number.
    pub price: Decimal,
    #[serde(default)]
    pub images: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
pub struct ImageResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct TrackingUpdateResponse {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    pub timestamp: String,
}
