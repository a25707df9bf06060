//! Store backend API client.
//!
//! # Architecture
//!
//! - The store backend is the source of truth for products, orders and
//!   payment references; the storefront never persists orders
//! - Plain JSON over HTTP with `reqwest`
//! - Two narrow capabilities, each a trait so the services can be driven by
//!   test doubles: [`CheckoutApi`] and [`TrackingApi`]
//!
//! # Endpoints
//!
//! ```text
//! POST {endpoint}/checkout                   create a payment session
//! GET  {endpoint}/orders/track?trackingId=   look up an order (never cached)
//! ```

mod client;
mod conversions;
pub mod types;

pub use client::BackendClient;

use std::future::Future;

use thiserror::Error;

use rwaya_core::TrackingCode;

use crate::models::{CheckoutIntent, Order, PaymentSession};

/// Errors that can occur when talking to the store backend.
#[derive(Debug, Error)]
pub enum StoreApiError {
    /// The request never got a response.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered `success: false` with a customer-facing reason.
    #[error("checkout rejected: {0}")]
    Rejected(String),

    /// The backend answered with an unexpected status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Body or reason, for logs only.
        message: String,
    },

    /// No order for this tracking code.
    #[error("order not found")]
    NotFound,

    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for StoreApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Payment session creation.
pub trait CheckoutApi: Send + Sync {
    /// Create a gateway session for the intent. Called once per attempt,
    /// never retried.
    fn create_session(
        &self,
        intent: &CheckoutIntent,
    ) -> impl Future<Output = Result<PaymentSession, StoreApiError>> + Send;
}

/// Order lookup by tracking code.
pub trait TrackingApi: Send + Sync {
    /// Fetch the current state of an order, bypassing every cache.
    fn fetch_order(
        &self,
        code: &TrackingCode,
    ) -> impl Future<Output = Result<Order, StoreApiError>> + Send;
}
