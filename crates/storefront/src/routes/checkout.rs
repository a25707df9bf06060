//! Checkout route handlers.
//!
//! `POST /checkout` runs one checkout attempt for the visitor. The outcome is
//! either a redirect to the identity provider, the payment page that opens
//! the gateway widget, or the cart page again with a notice.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{info, instrument};

use rwaya_core::{Price, ShippingMethod};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::{OptionalAuth, Visitor};
use crate::models::{CustomerDetails, Notice, OpenPayment, session_keys};
use crate::services::auth::SessionAuth;
use crate::services::cart::CartState;
use crate::services::checkout::CheckoutStep;
use crate::services::checkout::validation::{self, EMPTY_CART};
use crate::services::payment::PaymentLaunch;
use crate::services::pending::SessionIntentStore;
use crate::state::AppState;

use super::cart::{SessionCart, cart_page};

/// Checkout form prefill and shipping choices.
#[derive(Clone)]
pub struct CheckoutFormView {
    pub customer_name: String,
    pub customer_email: String,
    pub phone: String,
    pub address: String,
    pub county: String,
    pub id_number: String,
    pub courier_selected: bool,
    pub standard_label: &'static str,
    pub courier_label: &'static str,
    pub courier_surcharge: String,
    /// Advisory totals; the store API quote is authoritative.
    pub standard_total: String,
    pub courier_total: String,
}

impl CheckoutFormView {
    #[must_use]
    pub fn new(state: &AppState, cart: &CartState, details: &CustomerDetails) -> Self {
        let store = &state.config().store;
        let total = |method| {
            let quote = validation::quote(cart, method, store.courier_surcharge);
            Price::new(quote.total, store.currency).display()
        };

        Self {
            customer_name: details.customer_name.clone(),
            customer_email: details.customer_email.clone(),
            phone: details.phone.clone(),
            address: details.address.clone(),
            county: details.county.clone(),
            id_number: details.id_number.clone(),
            courier_selected: details.shipping_method == ShippingMethod::Courier,
            standard_label: ShippingMethod::Standard.label(),
            courier_label: ShippingMethod::Courier.label(),
            courier_surcharge: Price::new(store.courier_surcharge, store.currency).display(),
            standard_total: total(ShippingMethod::Standard),
            courier_total: total(ShippingMethod::Courier),
        }
    }
}

/// Payment page: loads the gateway script and opens the widget.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/pay.html")]
pub struct PayTemplate {
    pub launch: PaymentLaunch,
}

/// Record the open payment and render the page that opens the widget.
///
/// The record is what makes the widget's redirect marker count.
pub(crate) async fn open_gateway(session: &Session, launch: PaymentLaunch) -> Result<Response> {
    session
        .insert(
            session_keys::OPEN_PAYMENT,
            OpenPayment {
                reference: launch.reference.clone(),
            },
        )
        .await?;

    add_breadcrumb(
        "checkout",
        "Payment gateway opened",
        Some(&[("reference", launch.reference.as_str())]),
    );

    Ok(PayTemplate { launch }.into_response())
}

/// Start checkout.
///
/// The submitted details are kept as a draft so the form is prefilled and
/// a checkout interrupted by sign-in can resume with them.
#[instrument(skip_all, fields(shipping_method = %details.shipping_method))]
pub async fn submit(
    State(state): State<AppState>,
    visitor: Visitor,
    OptionalAuth(customer): OptionalAuth,
    Form(details): Form<CustomerDetails>,
) -> Result<Response> {
    let session = &visitor.session;
    let cart = SessionCart::load(session).await?;
    let snapshot = cart.store().get();
    let signed_in = customer.is_some();

    session
        .insert(session_keys::CHECKOUT_DRAFT, &details)
        .await?;

    if snapshot.is_empty() {
        return Ok(cart_page(
            &state,
            &snapshot,
            Some(Notice::error(EMPTY_CART)),
            &details,
            signed_in,
        )
        .into_response());
    }

    let mut checkout = match state.checkouts().acquire(&visitor.id).await {
        Ok(checkout) => checkout,
        Err(err) => {
            return Ok(
                cart_page(&state, &snapshot, Some(err.notice()), &details, signed_in)
                    .into_response(),
            );
        }
    };

    let auth = SessionAuth::new(
        session.clone(),
        state.sign_in().clone(),
        &state.config().base_url,
    );
    let pending = SessionIntentStore::new(session.clone());

    match checkout.initiate(&snapshot, &auth, &pending, &details).await {
        Ok(CheckoutStep::SignIn(redirect)) => {
            info!("Checkout requires sign-in");
            Ok(Redirect::to(&redirect.url).into_response())
        }
        Ok(CheckoutStep::OpenGateway(launch)) => open_gateway(session, launch).await,
        Ok(CheckoutStep::Nothing) => Ok(Redirect::to("/cart").into_response()),
        Err(err) => Ok(
            cart_page(&state, &snapshot, Some(err.notice()), &details, signed_in)
                .into_response(),
        ),
    }
}
