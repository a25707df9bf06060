//! Session-related types.
//!
//! Everything that must survive a full-page navigation (the sign-in hop and
//! the payment widget redirect) lives in the visitor's session record.

use serde::{Deserialize, Serialize};

use rwaya_core::{CustomerId, Email};

/// Session-stored customer identity, as resolved by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerIdentity {
    /// Provider subject identifier.
    pub id: CustomerId,
    /// Primary email, if the account has one.
    pub email: Option<Email>,
}

/// The payment hand-off currently open for this session.
///
/// Written when the payment page is rendered, removed by the first
/// redirect marker that is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPayment {
    /// Gateway session reference.
    pub reference: String,
}

/// Session keys.
pub mod keys {
    /// Cart snapshot.
    pub const CART: &str = "cart";

    /// Pending checkout flag, set right before the sign-in redirect.
    pub const PENDING_CHECKOUT: &str = "pending_checkout";

    /// Last submitted checkout form.
    pub const CHECKOUT_DRAFT: &str = "checkout_draft";

    /// Open payment hand-off (see [`super::OpenPayment`]).
    pub const OPEN_PAYMENT: &str = "open_payment";

    /// One-shot notice shown on the next cart render.
    pub const FLASH_NOTICE: &str = "flash_notice";

    /// Signed-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// OAuth state (CSRF protection).
    pub const AUTH_STATE: &str = "auth_state";

    /// Path to return to after sign-in.
    pub const AUTH_RETURN_TO: &str = "auth_return_to";

    /// Stable per-visitor key for the in-memory checkout and tracking
    /// registries. The session id itself is not assigned until the first
    /// save, so it cannot be used on a visitor's first request.
    pub const VISITOR_ID: &str = "visitor_id";
}
