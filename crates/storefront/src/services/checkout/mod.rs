//! Checkout orchestration.
//!
//! # Flow
//!
//! ```text
//! Idle ──(not signed in)──► AwaitingAuth ──(signed in, flag consumed)──┐
//!  │                                                                    │
//!  └──(signed in)──► SessionRequested ◄─────────────────────────────────┘
//!                         │
//!                         ▼
//!                    GatewayOpen ──(success=1 | canceled=1)──► Resolved
//! ```
//!
//! Every failure returns the orchestrator to `Idle` with the cart untouched,
//! and surfaces as one [`Notice`](crate::models::Notice) via
//! [`CheckoutError::notice`]. Nothing is retried automatically.
//!
//! The orchestrator only knows the capabilities it needs: [`CheckoutApi`]
//! for the session, [`PaymentGateway`] for the payment UI, [`AuthGateway`]
//! for identity and [`PendingIntentStore`] for the flag that survives the
//! sign-in navigation.

mod error;
mod registry;
pub mod validation;

pub use error::CheckoutError;
pub use registry::CheckoutRegistry;

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use rwaya_core::{Email, PaymentOutcome, ShippingMethod};

use crate::models::{CheckoutQuote, CustomerDetails, Notice};
use crate::services::auth::{AuthGateway, SignInRedirect};
use crate::services::cart::{CartState, CartStore};
use crate::services::payment::{PaymentGateway, PaymentHandle, PaymentLaunch, PaymentSetup};
use crate::services::pending::PendingIntentStore;
use crate::store_api::CheckoutApi;

use validation::NO_ACCOUNT_EMAIL;

/// Where sign-in returns to when checkout triggered it.
pub const CHECKOUT_RETURN_PATH: &str = "/cart";

pub const PAYMENT_SUCCEEDED: &str = "Payment received. Thank you, your order has been placed!";
pub const PAYMENT_CANCELED: &str = "Payment was canceled. Your cart has been kept.";

/// Store-wide checkout parameters.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    /// Gateway public key.
    pub public_key: String,
    /// Added to the advisory total for non-default shipping methods.
    pub courier_surcharge: Decimal,
    /// Where the gateway navigates after a successful payment.
    pub callback_url: String,
    /// Where the gateway navigates when the customer closes it.
    pub cancel_url: String,
}

/// Where a checkout attempt currently stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    /// Sign-in redirect issued; waiting for the customer to come back.
    AwaitingAuth,
    /// Session request sent to the store API.
    SessionRequested,
    /// The payment UI has control.
    GatewayOpen { reference: String },
    Resolved(PaymentOutcome),
}

/// What the caller has to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutStep {
    /// Send the browser to the identity provider.
    SignIn(SignInRedirect),
    /// Render the payment page.
    OpenGateway(PaymentLaunch),
    Nothing,
}

/// Drives one visitor's checkout.
pub struct CheckoutOrchestrator<C, P> {
    api: C,
    gateway: P,
    settings: Arc<CheckoutSettings>,
    phase: CheckoutPhase,
}

impl<C, P> CheckoutOrchestrator<C, P>
where
    C: CheckoutApi,
    P: PaymentGateway,
{
    #[must_use]
    pub fn new(api: C, gateway: P, settings: Arc<CheckoutSettings>) -> Self {
        Self {
            api,
            gateway,
            settings,
            phase: CheckoutPhase::Idle,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> &CheckoutPhase {
        &self.phase
    }

    /// Advisory total for the cart with the given shipping method.
    #[must_use]
    pub fn quote(&self, cart: &CartState, method: ShippingMethod) -> CheckoutQuote {
        validation::quote(cart, method, self.settings.courier_surcharge)
    }

    /// Start a checkout from the submitted form.
    ///
    /// A signed-out customer is sent to sign in with the pending flag set;
    /// nothing is submitted. A signed-in customer's details are validated
    /// and a payment session is created.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InFlight`] while a payment is open, or the
    /// error that ended the attempt (the phase is back to `Idle` then).
    #[instrument(skip_all)]
    pub async fn initiate<A, S>(
        &mut self,
        cart: &CartState,
        auth: &A,
        pending: &S,
        details: &CustomerDetails,
    ) -> Result<CheckoutStep, CheckoutError>
    where
        A: AuthGateway,
        S: PendingIntentStore,
    {
        self.ensure_available()?;

        let result = match auth.current_identity().await {
            Ok(None) => self.start_sign_in(auth, pending).await,
            Ok(Some(identity)) => self.submit(cart, details, identity.email.as_ref()).await,
            Err(err) => Err(err.into()),
        };
        self.settle(result)
    }

    /// Continue a checkout interrupted by sign-in.
    ///
    /// Does nothing unless the customer is signed in and the pending flag is
    /// set. The flag is consumed first, so however often this runs after the
    /// sign-in, at most one session request is made. The signed-in account's
    /// email always replaces the one in `draft`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the account has no email, otherwise the
    /// same errors as [`Self::initiate`].
    #[instrument(skip_all)]
    pub async fn resume<A, S>(
        &mut self,
        cart: &CartState,
        auth: &A,
        pending: &S,
        draft: Option<&CustomerDetails>,
    ) -> Result<CheckoutStep, CheckoutError>
    where
        A: AuthGateway,
        S: PendingIntentStore,
    {
        let Some(identity) = auth.current_identity().await? else {
            return Ok(CheckoutStep::Nothing);
        };

        if !pending.consume().await? {
            return Ok(CheckoutStep::Nothing);
        }

        self.ensure_available()?;
        info!(customer_id = %identity.id, "Resuming checkout after sign-in");

        let result = match identity.email {
            Some(email) => {
                let mut details = draft.cloned().unwrap_or_default();
                details.customer_email = email.into_inner();
                self.submit(cart, &details, None).await
            }
            None => Err(CheckoutError::Validation(NO_ACCOUNT_EMAIL.to_string())),
        };
        self.settle(result)
    }

    /// Apply the outcome the gateway reported through the redirect marker.
    ///
    /// Success empties the cart; cancellation leaves it alone.
    pub fn resolve(&mut self, outcome: PaymentOutcome, cart: &CartStore) -> Notice {
        if let CheckoutPhase::GatewayOpen { reference } = &self.phase {
            info!(reference = %reference, ?outcome, "Payment resolved");
        } else {
            info!(?outcome, "Payment resolved");
        }

        self.phase = CheckoutPhase::Resolved(outcome);

        match outcome {
            PaymentOutcome::Succeeded => {
                cart.remove_all();
                Notice::success(PAYMENT_SUCCEEDED)
            }
            PaymentOutcome::Canceled => Notice::info(PAYMENT_CANCELED),
        }
    }

    /// Forget an open payment hand-off the customer navigated away from.
    ///
    /// Returns whether there was one.
    pub fn abandon_gateway(&mut self) -> bool {
        if matches!(self.phase, CheckoutPhase::GatewayOpen { .. }) {
            self.phase = CheckoutPhase::Idle;
            true
        } else {
            false
        }
    }

    fn ensure_available(&mut self) -> Result<(), CheckoutError> {
        match self.phase {
            CheckoutPhase::GatewayOpen { .. } => Err(CheckoutError::InFlight),
            // Only reachable if the request that set it was dropped mid-flight.
            CheckoutPhase::SessionRequested => {
                warn!("Discarding abandoned session request");
                self.phase = CheckoutPhase::Idle;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn settle(
        &mut self,
        result: Result<CheckoutStep, CheckoutError>,
    ) -> Result<CheckoutStep, CheckoutError> {
        if let Err(err) = &result {
            if err.is_validation() {
                info!(error = %err, "Checkout rejected");
            } else {
                warn!(error = %err, "Checkout failed");
            }
            self.phase = CheckoutPhase::Idle;
        }
        result
    }

    async fn start_sign_in<A, S>(
        &mut self,
        auth: &A,
        pending: &S,
    ) -> Result<CheckoutStep, CheckoutError>
    where
        A: AuthGateway,
        S: PendingIntentStore,
    {
        pending.set().await?;

        match auth.sign_in(CHECKOUT_RETURN_PATH).await {
            Ok(redirect) => {
                info!("Customer not signed in, redirecting to sign-in");
                self.phase = CheckoutPhase::AwaitingAuth;
                Ok(CheckoutStep::SignIn(redirect))
            }
            Err(err) => {
                // No redirect happened, so nothing should resume later.
                if let Err(clear_err) = pending.consume().await {
                    warn!(error = %clear_err, "Failed to clear pending checkout flag");
                }
                Err(err.into())
            }
        }
    }

    async fn submit(
        &mut self,
        cart: &CartState,
        details: &CustomerDetails,
        fallback_email: Option<&Email>,
    ) -> Result<CheckoutStep, CheckoutError> {
        let intent = validation::build_intent(cart, details, fallback_email)?;
        let quote = self.quote(cart, intent.shipping_method);

        self.phase = CheckoutPhase::SessionRequested;
        let session = self.api.create_session(&intent).await?;

        if quote.total_minor_units(session.currency) != Some(session.amount) {
            warn!(
                reference = %session.reference,
                quoted = %quote.total,
                charged = session.amount,
                "Session amount differs from the cart quote; charging the session amount"
            );
        }

        let reference = session.reference.clone();
        let handle = self.gateway.setup(PaymentSetup {
            key: self.settings.public_key.clone(),
            email: session.customer_email,
            amount: session.amount,
            reference: session.reference,
            currency: session.currency,
            callback_url: self.settings.callback_url.clone(),
            cancel_url: self.settings.cancel_url.clone(),
        })?;

        info!(reference = %reference, "Opening payment gateway");
        self.phase = CheckoutPhase::GatewayOpen { reference };

        Ok(CheckoutStep::OpenGateway(handle.open()))
    }
}

impl<C, P> std::fmt::Debug for CheckoutOrchestrator<C, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutOrchestrator")
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
