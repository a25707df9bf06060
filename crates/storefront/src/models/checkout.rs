//! Checkout data: the form draft, the validated intent and the gateway
//! session the store API hands back.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rwaya_core::{CurrencyCode, Email, ProductId, Quantity, ShippingMethod};

/// Checkout form as submitted.
///
/// Kept in the session so the checkout can be validated and submitted again
/// after the sign-in hop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub id_number: String,
    #[serde(default)]
    pub shipping_method: ShippingMethod,
}

/// One cart line as sent to the checkout API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub id: ProductId,
    pub quantity: Quantity,
}

/// A validated checkout attempt.
///
/// Built fresh for every attempt and dropped once the session request
/// returns. All text fields are trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutIntent {
    pub lines: Vec<CheckoutLine>,
    pub customer_email: Email,
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub county: String,
    pub id_number: String,
    pub shipping_method: ShippingMethod,
}

/// Gateway session issued by the store API for one payment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
    /// Unique per attempt; the only correlation key for the callback.
    pub reference: String,
    /// Authoritative amount in minor currency units.
    pub amount: i64,
    pub currency: CurrencyCode,
    pub customer_email: String,
}

/// Advisory amount computed from the cart.
///
/// The amount charged is whatever the store API returns in the
/// [`PaymentSession`]; this is only shown to the customer and compared
/// against it for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutQuote {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl CheckoutQuote {
    /// The total in minor units, if it fits.
    #[must_use]
    pub fn total_minor_units(&self, currency: CurrencyCode) -> Option<i64> {
        rwaya_core::Price::new(self.total, currency).to_minor_units()
    }
}
