//! Cart route handlers.
//!
//! The cart lives in the visitor session. Each request rebuilds a
//! [`CartStore`] from the stored snapshot; a subscription marks it dirty on
//! change so only mutated carts are written back.
//!
//! The cart page is also where checkout comes back to: the payment widget
//! returns with `?success=1` / `?canceled=1`, and sign-in returns here to
//! resume a pending checkout.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{debug, info, instrument, warn};

use rwaya_core::{CurrencyCode, PaymentOutcome, Price, ProductId, Quantity};

use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, Visitor};
use crate::models::{CustomerDetails, Notice, OpenPayment, session_keys};
use crate::services::auth::SessionAuth;
use crate::services::cart::{
    CartError, CartItem, CartState, CartStore, Subscription, check_price,
};
use crate::services::checkout::CheckoutStep;
use crate::services::pending::SessionIntentStore;
use crate::state::AppState;

use super::checkout::{CheckoutFormView, open_gateway};

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image_url: Option<String>,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u64,
    pub is_empty: bool,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &CartState, currency: CurrencyCode) -> Self {
        let items = cart
            .items()
            .iter()
            .map(|item| CartItemView {
                id: item.id.to_string(),
                name: item.name.clone(),
                quantity: item.quantity.get(),
                price: Price::new(item.price, currency).display(),
                line_price: Price::new(item.line_total(), currency).display(),
                image_url: item.image_url.clone(),
            })
            .collect();

        Self {
            items,
            subtotal: Price::new(cart.total_price(), currency).display(),
            item_count: cart.total_quantity(),
            is_empty: cart.is_empty(),
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// The visitor's cart for the duration of one request.
pub struct SessionCart {
    store: CartStore,
    dirty: Arc<AtomicBool>,
    _subscription: Subscription,
}

impl SessionCart {
    /// Load the cart from the session (empty if there is none).
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn load(session: &Session) -> Result<Self> {
        let state = session
            .get::<CartState>(session_keys::CART)
            .await?
            .unwrap_or_default();

        let store = CartStore::from_state(state);
        let dirty = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&dirty);
        let subscription = store.subscribe(move |_| flag.store(true, Ordering::SeqCst));

        Ok(Self {
            store,
            dirty,
            _subscription: subscription,
        })
    }

    #[must_use]
    pub const fn store(&self) -> &CartStore {
        &self.store
    }

    /// Write the cart back if it changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn save(&self, session: &Session) -> Result<()> {
        if self.dirty.swap(false, Ordering::SeqCst) {
            session
                .insert(session_keys::CART, &*self.store.get())
                .await?;
        }
        Ok(())
    }
}

// =============================================================================
// Forms and Templates
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: Option<i64>,
    pub image_url: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub id: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub id: String,
}

/// Redirect markers the payment widget appends.
#[derive(Debug, Default, Deserialize)]
pub struct CartQuery {
    pub success: Option<String>,
    pub canceled: Option<String>,
}

impl CartQuery {
    fn outcome(&self) -> Option<PaymentOutcome> {
        if self.success.as_deref() == Some("1") {
            Some(PaymentOutcome::Succeeded)
        } else if self.canceled.as_deref() == Some("1") {
            Some(PaymentOutcome::Canceled)
        } else {
            None
        }
    }

    const fn has_marker(&self) -> bool {
        self.success.is_some() || self.canceled.is_some()
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub notice: Option<Notice>,
    pub form: CheckoutFormView,
    pub signed_in: bool,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub notice: Option<Notice>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Render the cart page.
pub(crate) fn cart_page(
    state: &AppState,
    cart: &CartState,
    notice: Option<Notice>,
    details: &CustomerDetails,
    signed_in: bool,
) -> CartShowTemplate {
    let config = state.config();
    CartShowTemplate {
        cart: CartView::new(cart, config.store.currency),
        notice,
        form: CheckoutFormView::new(state, cart, details),
        signed_in,
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
///
/// Applies a payment redirect marker (then redirects to the bare URL so a
/// reload does not apply it again), abandons a payment hand-off the
/// customer navigated away from, and resumes a checkout interrupted by
/// sign-in.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    visitor: Visitor,
    OptionalAuth(customer): OptionalAuth,
    Query(query): Query<CartQuery>,
) -> Result<Response> {
    let session = &visitor.session;
    let cart = SessionCart::load(session).await?;

    if query.has_marker() {
        apply_marker(&state, &visitor, &cart, query.outcome()).await?;
        return Ok(Redirect::to("/cart").into_response());
    }

    let draft = session
        .get::<CustomerDetails>(session_keys::CHECKOUT_DRAFT)
        .await?;
    let mut notice = None;

    match state.checkouts().acquire(&visitor.id).await {
        Ok(mut checkout) => {
            if checkout.abandon_gateway() {
                debug!("Payment hand-off abandoned");
                session
                    .remove::<OpenPayment>(session_keys::OPEN_PAYMENT)
                    .await?;
            }

            let auth = SessionAuth::new(
                session.clone(),
                state.sign_in().clone(),
                &state.config().base_url,
            );
            let pending = SessionIntentStore::new(session.clone());

            match checkout
                .resume(&cart.store().get(), &auth, &pending, draft.as_ref())
                .await
            {
                Ok(CheckoutStep::OpenGateway(launch)) => {
                    return open_gateway(session, launch).await;
                }
                Ok(CheckoutStep::SignIn(redirect)) => {
                    return Ok(Redirect::to(&redirect.url).into_response());
                }
                Ok(CheckoutStep::Nothing) => {}
                Err(err) => notice = Some(err.notice()),
            }
        }
        Err(err) => notice = Some(err.notice()),
    }

    // Only a rendered cart page consumes the flash.
    let flash = session.remove::<Notice>(session_keys::FLASH_NOTICE).await?;

    Ok(cart_page(
        &state,
        &cart.store().get(),
        notice.or(flash),
        &draft.unwrap_or_default(),
        customer.is_some(),
    )
    .into_response())
}

/// Apply a redirect marker if it belongs to the open payment.
///
/// The open payment record is removed in the same step, so a replayed or
/// forged marker has no effect.
async fn apply_marker(
    state: &AppState,
    visitor: &Visitor,
    cart: &SessionCart,
    outcome: Option<PaymentOutcome>,
) -> Result<()> {
    let session = &visitor.session;

    let Some(outcome) = outcome else {
        debug!("Ignoring unrecognized redirect marker");
        return Ok(());
    };

    let mut checkout = match state.checkouts().acquire(&visitor.id).await {
        Ok(checkout) => checkout,
        Err(err) => {
            warn!(error = %err, "Redirect marker arrived during another checkout request");
            session
                .insert(session_keys::FLASH_NOTICE, err.notice())
                .await?;
            return Ok(());
        }
    };

    let Some(open) = session
        .remove::<OpenPayment>(session_keys::OPEN_PAYMENT)
        .await?
    else {
        debug!(?outcome, "Ignoring redirect marker without an open payment");
        return Ok(());
    };

    info!(reference = %open.reference, ?outcome, "Applying payment redirect marker");
    let notice = checkout.resolve(outcome, cart.store());
    cart.save(session).await?;

    if outcome == PaymentOutcome::Succeeded {
        session
            .remove::<CustomerDetails>(session_keys::CHECKOUT_DRAFT)
            .await?;
    }

    session.insert(session_keys::FLASH_NOTICE, notice).await?;
    Ok(())
}

/// Add item to cart (HTMX).
///
/// Adding an item that is already in the cart leaves its quantity alone.
/// Returns the count badge with an HTMX trigger for other cart elements.
#[instrument(skip_all, fields(product_id = %form.id))]
pub async fn add(visitor: Visitor, Form(form): Form<AddToCartForm>) -> Result<Response> {
    let quantity = Quantity::new(form.quantity.unwrap_or(1))
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let price = check_price(form.price).map_err(|e| AppError::BadRequest(e.to_string()))?;
    if form.id.trim().is_empty() {
        return Err(AppError::BadRequest("missing product id".to_string()));
    }

    let cart = SessionCart::load(&visitor.session).await?;
    let added = cart.store().add_item(CartItem {
        id: ProductId::new(form.id.trim()),
        name: form.name,
        price,
        quantity,
        image_url: form.image_url.filter(|url| !url.is_empty()),
    });
    cart.save(&visitor.session).await?;

    debug!(added, "Add to cart");

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartCountTemplate {
            count: cart.store().total_quantity(),
        },
    )
        .into_response())
}

/// Update cart item quantity (HTMX).
#[instrument(skip_all, fields(product_id = %form.id))]
pub async fn update(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let cart = SessionCart::load(&visitor.session).await?;

    let notice = match cart
        .store()
        .update_quantity(&ProductId::new(form.id), form.quantity)
    {
        Ok(()) => None,
        Err(CartError::Validation(_)) => Some(Notice::error("Quantity must be at least 1")),
        Err(CartError::NotInCart(_) | CartError::InvalidPrice(_)) => {
            Some(Notice::error("That item is no longer in your cart"))
        }
    };
    cart.save(&visitor.session).await?;

    Ok(items_fragment(&state, cart.store(), notice))
}

/// Remove item from cart (HTMX).
#[instrument(skip_all, fields(product_id = %form.id))]
pub async fn remove(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let cart = SessionCart::load(&visitor.session).await?;
    cart.store().remove_item(&ProductId::new(form.id));
    cart.save(&visitor.session).await?;

    Ok(items_fragment(&state, cart.store(), None))
}

/// Empty the cart (HTMX).
#[instrument(skip_all)]
pub async fn clear(State(state): State<AppState>, visitor: Visitor) -> Result<Response> {
    let cart = SessionCart::load(&visitor.session).await?;
    cart.store().remove_all();
    cart.save(&visitor.session).await?;

    Ok(items_fragment(&state, cart.store(), None))
}

/// Get cart count badge (HTMX).
#[instrument(skip_all)]
pub async fn count(visitor: Visitor) -> Result<CartCountTemplate> {
    let cart = SessionCart::load(&visitor.session).await?;
    Ok(CartCountTemplate {
        count: cart.store().total_quantity(),
    })
}

fn items_fragment(state: &AppState, store: &CartStore, notice: Option<Notice>) -> Response {
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::new(&store.get(), state.config().store.currency),
            notice,
        },
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_parsing() {
        let query = |success: Option<&str>, canceled: Option<&str>| CartQuery {
            success: success.map(String::from),
            canceled: canceled.map(String::from),
        };

        assert_eq!(query(Some("1"), None).outcome(), Some(PaymentOutcome::Succeeded));
        assert_eq!(query(None, Some("1")).outcome(), Some(PaymentOutcome::Canceled));
        assert_eq!(query(Some("true"), None).outcome(), None);
        assert!(query(Some("true"), None).has_marker());
        assert!(!CartQuery::default().has_marker());
    }

    #[test]
    fn test_cart_view_formats_amounts() {
        let store = CartStore::new();
        store.add_item(crate::services::cart::tests::item("a", 100, 2));
        store.add_item(crate::services::cart::tests::item("b", 50, 1));

        let view = CartView::new(&store.get(), CurrencyCode::KES);

        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, "KSh 250.00");
        assert_eq!(view.items[0].line_price, "KSh 200.00");
        assert!(!view.is_empty);
    }
}
