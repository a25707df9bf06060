//! Checkout form validation.
//!
//! Fields are checked in form order and the first failure wins, so the
//! customer always sees one message about the topmost problem.

use rust_decimal::Decimal;

use rwaya_core::{Email, ShippingMethod};

use super::CheckoutError;
use crate::models::{CheckoutIntent, CheckoutLine, CheckoutQuote, CustomerDetails};
use crate::services::cart::CartState;

pub const EMPTY_CART: &str = "Your cart is empty";
pub const MISSING_NAME: &str = "Please enter your full name";
pub const MISSING_PHONE: &str = "Please enter your phone number";
pub const MISSING_ADDRESS: &str = "Please enter your delivery address";
pub const MISSING_COUNTY: &str = "Please select your county";
pub const MISSING_ID_NUMBER: &str = "Please enter your ID number";
pub const INVALID_EMAIL: &str = "Please enter a valid email address";
pub const NO_ACCOUNT_EMAIL: &str =
    "Your account has no email address. Add one to your profile to continue.";

fn required(value: &str, message: &str) -> Result<String, CheckoutError> {
    let value = value.trim();
    if value.is_empty() {
        Err(CheckoutError::Validation(message.to_string()))
    } else {
        Ok(value.to_string())
    }
}

/// Build a [`CheckoutIntent`] from the cart and the submitted details.
///
/// An empty email field falls back to `fallback_email` (the signed-in
/// customer's address) when there is one.
///
/// # Errors
///
/// Returns [`CheckoutError::Validation`] with the message for the first
/// problem found.
pub fn build_intent(
    cart: &CartState,
    details: &CustomerDetails,
    fallback_email: Option<&Email>,
) -> Result<CheckoutIntent, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::Validation(EMPTY_CART.to_string()));
    }

    let customer_name = required(&details.customer_name, MISSING_NAME)?;
    let phone = required(&details.phone, MISSING_PHONE)?;
    let address = required(&details.address, MISSING_ADDRESS)?;
    let county = required(&details.county, MISSING_COUNTY)?;
    let id_number = required(&details.id_number, MISSING_ID_NUMBER)?;

    let customer_email = match (details.customer_email.trim(), fallback_email) {
        ("", Some(email)) => email.clone(),
        (input, _) => Email::parse(input)
            .map_err(|_| CheckoutError::Validation(INVALID_EMAIL.to_string()))?,
    };

    let lines = cart
        .items()
        .iter()
        .map(|item| CheckoutLine {
            id: item.id.clone(),
            quantity: item.quantity,
        })
        .collect();

    Ok(CheckoutIntent {
        lines,
        customer_email,
        customer_name,
        phone,
        address,
        county,
        id_number,
        shipping_method: details.shipping_method,
    })
}

/// Advisory total: line totals plus the surcharge for non-default shipping.
#[must_use]
pub fn quote(cart: &CartState, method: ShippingMethod, surcharge: Decimal) -> CheckoutQuote {
    let subtotal = cart.total_price();
    let shipping = if method.is_default() {
        Decimal::ZERO
    } else {
        surcharge
    };

    CheckoutQuote {
        subtotal,
        shipping,
        total: subtotal.saturating_add(shipping),
    }
}
