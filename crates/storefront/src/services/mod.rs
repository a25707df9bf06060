//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - Cart state with change notification
//! - `pending` - Pending checkout flag that survives the sign-in hop
//! - `checkout` - Checkout orchestration (sign-in, session, payment hand-off)
//! - `tracking` - Order lookup with last-request-wins display state
//! - `auth` - Customer identity via the hosted OAuth provider
//! - `payment` - Payment gateway capability and the inline widget

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod payment;
pub mod pending;
pub mod tracking;
