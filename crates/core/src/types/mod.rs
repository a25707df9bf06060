//! Core types for Rwaya.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod quantity;
pub mod shipping;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price, format_amount};
pub use quantity::{Quantity, QuantityError};
pub use shipping::{ShippingMethod, UnknownShippingMethod};
pub use status::*;
