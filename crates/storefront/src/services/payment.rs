//! Payment gateway capability.
//!
//! The checkout orchestration only depends on [`PaymentGateway`]: set up a
//! handle for one payment session, then open it. [`InlineGateway`] is the
//! hosted inline widget implementation: opening it produces a
//! [`PaymentLaunch`] that the storefront renders as a page which loads the
//! provider's script and hands control to the widget. The widget reports
//! back by navigating to the callback (success) or cancel URL.

use serde::Serialize;
use thiserror::Error;

use rwaya_core::{CurrencyCode, Price};

/// Errors from setting up a payment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("payment public key is not configured")]
    MissingKey,

    #[error("payment amount must be positive (got {0})")]
    InvalidAmount(i64),

    #[error("customer email is required")]
    MissingEmail,
}

/// Parameters for one payment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSetup {
    /// Gateway public key.
    pub key: String,
    pub email: String,
    /// Minor currency units.
    pub amount: i64,
    /// Gateway session reference from the store API.
    pub reference: String,
    pub currency: CurrencyCode,
    /// Where the widget navigates after a successful payment.
    pub callback_url: String,
    /// Where the widget navigates when the customer closes it.
    pub cancel_url: String,
}

/// A set-up payment, ready to be opened.
pub trait PaymentHandle: Send {
    /// Hand control to the payment UI.
    fn open(self) -> PaymentLaunch;
}

/// Payment provider integration.
pub trait PaymentGateway: Send + Sync {
    type Handle: PaymentHandle;

    /// Prepare a payment.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError`] if the parameters cannot be used.
    fn setup(&self, setup: PaymentSetup) -> Result<Self::Handle, PaymentError>;
}

/// Everything the payment page needs to open the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentLaunch {
    pub script_url: String,
    pub key: String,
    pub email: String,
    pub amount: i64,
    pub reference: String,
    pub currency: String,
    pub callback_url: String,
    pub cancel_url: String,
    /// Formatted amount for display, e.g. `KSh 1,500.00`.
    pub display_amount: String,
}

/// Hosted inline payment widget.
#[derive(Debug, Clone)]
pub struct InlineGateway {
    script_url: String,
}

impl InlineGateway {
    #[must_use]
    pub fn new(script_url: impl Into<String>) -> Self {
        Self {
            script_url: script_url.into(),
        }
    }
}

/// Handle returned by [`InlineGateway::setup`].
#[derive(Debug)]
pub struct InlineHandle {
    script_url: String,
    setup: PaymentSetup,
}

impl PaymentGateway for InlineGateway {
    type Handle = InlineHandle;

    fn setup(&self, setup: PaymentSetup) -> Result<InlineHandle, PaymentError> {
        if setup.key.trim().is_empty() {
            return Err(PaymentError::MissingKey);
        }
        if setup.amount <= 0 {
            return Err(PaymentError::InvalidAmount(setup.amount));
        }
        if setup.email.trim().is_empty() {
            return Err(PaymentError::MissingEmail);
        }

        Ok(InlineHandle {
            script_url: self.script_url.clone(),
            setup,
        })
    }
}

impl PaymentHandle for InlineHandle {
    fn open(self) -> PaymentLaunch {
        let setup = self.setup;
        let display_amount = Price::from_minor_units(setup.amount, setup.currency).display();

        PaymentLaunch {
            script_url: self.script_url,
            key: setup.key,
            email: setup.email,
            amount: setup.amount,
            reference: setup.reference,
            currency: setup.currency.code().to_string(),
            callback_url: setup.callback_url,
            cancel_url: setup.cancel_url,
            display_amount,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn setup() -> PaymentSetup {
        PaymentSetup {
            key: "pk_test_8f2a".to_string(),
            email: "amina@example.com".to_string(),
            amount: 55_000,
            reference: "ref_123".to_string(),
            currency: CurrencyCode::KES,
            callback_url: "/cart?success=1".to_string(),
            cancel_url: "/cart?canceled=1".to_string(),
        }
    }

    #[test]
    fn test_open_produces_launch() {
        let gateway = InlineGateway::new("https://js.paystack.co/v1/inline.js");
        let launch = gateway.setup(setup()).unwrap().open();

        assert_eq!(launch.reference, "ref_123");
        assert_eq!(launch.amount, 55_000);
        assert_eq!(launch.currency, "KES");
        assert_eq!(launch.display_amount, "KSh 550.00");
        assert_eq!(launch.callback_url, "/cart?success=1");
        assert_eq!(launch.cancel_url, "/cart?canceled=1");
    }

    #[test]
    fn test_setup_rejects_missing_key() {
        let gateway = InlineGateway::new("https://js.paystack.co/v1/inline.js");
        let err = gateway
            .setup(PaymentSetup {
                key: "  ".to_string(),
                ..setup()
            })
            .unwrap_err();
        assert_eq!(err, PaymentError::MissingKey);
    }

    #[test]
    fn test_setup_rejects_non_positive_amount() {
        let gateway = InlineGateway::new("https://js.paystack.co/v1/inline.js");
        for amount in [0, -100] {
            let err = gateway
                .setup(PaymentSetup {
                    amount,
                    ..setup()
                })
                .unwrap_err();
            assert_eq!(err, PaymentError::InvalidAmount(amount));
        }
    }
}
