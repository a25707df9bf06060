//! Checkout error types.

use thiserror::Error;

use crate::models::Notice;
use crate::services::auth::AuthError;
use crate::services::payment::PaymentError;
use crate::services::pending::IntentStoreError;
use crate::store_api::StoreApiError;

const NETWORK_MESSAGE: &str =
    "We couldn't reach the store. Please check your connection and try again.";
const API_FALLBACK_MESSAGE: &str = "Checkout failed. Please try again.";
const IN_FLIGHT_MESSAGE: &str = "A payment is already in progress";
const GATEWAY_MESSAGE: &str = "The payment window could not be opened. Please try again.";
const INTERNAL_MESSAGE: &str = "Something went wrong. Please try again.";
const SIGN_IN_MESSAGE: &str = "Sign-in could not be started. Please try again.";

/// Errors that can occur during a checkout attempt.
///
/// None of these escape the orchestration boundary: each becomes a single
/// [`Notice`] through [`CheckoutError::notice`].
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A field is missing or malformed. Raised before any network call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The checkout request never got a response.
    #[error("network error: {0}")]
    Network(String),

    /// The store API answered with a failure.
    #[error("checkout API error: {detail}")]
    Api {
        /// What went wrong, for logs.
        detail: String,
        /// Customer-facing reason from the API, if it gave one.
        reason: Option<String>,
    },

    /// A payment session is already being created or is open.
    #[error("checkout already in progress")]
    InFlight,

    /// The payment gateway refused the session parameters.
    #[error("payment gateway error: {0}")]
    Gateway(#[from] PaymentError),

    /// The pending checkout flag could not be read or written.
    #[error("pending checkout storage error: {0}")]
    Storage(#[from] IntentStoreError),

    /// Starting the sign-in failed.
    #[error("sign-in error: {0}")]
    Auth(#[from] AuthError),
}

impl CheckoutError {
    /// The one notice the customer sees for this error.
    #[must_use]
    pub fn notice(&self) -> Notice {
        let message = match self {
            Self::Validation(message) => message.as_str(),
            Self::Network(_) => NETWORK_MESSAGE,
            Self::Api {
                reason: Some(reason),
                ..
            } if !reason.trim().is_empty() => reason.as_str(),
            Self::Api { .. } => API_FALLBACK_MESSAGE,
            Self::InFlight => IN_FLIGHT_MESSAGE,
            Self::Gateway(_) => GATEWAY_MESSAGE,
            Self::Storage(_) => INTERNAL_MESSAGE,
            Self::Auth(_) => SIGN_IN_MESSAGE,
        };
        Notice::error(message)
    }

    /// Whether this is a local validation failure.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<StoreApiError> for CheckoutError {
    fn from(err: StoreApiError) -> Self {
        match err {
            StoreApiError::Network(detail) => Self::Network(detail),
            StoreApiError::Rejected(reason) => Self::Api {
                detail: format!("rejected: {reason}"),
                reason: Some(reason),
            },
            other => Self::Api {
                detail: other.to_string(),
                reason: None,
            },
        }
    }
}
