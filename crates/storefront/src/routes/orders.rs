//! Order tracking and post-checkout pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use rwaya_core::{CurrencyCode, Price};

use crate::error::Result;
use crate::middleware::Visitor;
use crate::models::TrackedOrder;
use crate::services::tracking::{TrackOutcome, TrackerView};
use crate::state::AppState;

const DATE_FORMAT: &str = "%b %-d, %Y";
const TIMESTAMP_FORMAT: &str = "%b %-d, %Y %H:%M";

/// Order line display data.
#[derive(Clone)]
pub struct OrderItemView {
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub image_url: Option<String>,
}

/// Tracking timeline entry display data.
#[derive(Clone)]
pub struct TrackingUpdateView {
    pub status: String,
    pub location: Option<String>,
    pub note: Option<String>,
    pub timestamp: String,
}

/// Tracked order display data.
#[derive(Clone)]
pub struct OrderView {
    pub number: String,
    pub tracking_id: Option<String>,
    pub status: String,
    pub badge_class: &'static str,
    pub payment: &'static str,
    pub placed_on: String,
    pub customer_name: String,
    pub address: String,
    pub county: String,
    pub total: String,
    pub items: Vec<OrderItemView>,
    /// In the order the store API returned them.
    pub updates: Vec<TrackingUpdateView>,
}

impl OrderView {
    #[must_use]
    pub fn new(tracked: &TrackedOrder, currency: CurrencyCode) -> Self {
        let order = &tracked.order;
        Self {
            number: tracked.short_number().to_string(),
            tracking_id: order.tracking_id.clone(),
            status: tracked.latest_status().to_string(),
            badge_class: tracked.category.badge_class(),
            payment: tracked.payment_label(),
            placed_on: order.created_at.format(DATE_FORMAT).to_string(),
            customer_name: order.customer_name.clone(),
            address: order.address.clone(),
            county: order.county.clone(),
            total: Price::new(tracked.total, currency).display(),
            items: order
                .order_items
                .iter()
                .map(|item| OrderItemView {
                    name: item.product.name.clone(),
                    quantity: item.quantity,
                    price: Price::new(item.product.price, currency).display(),
                    image_url: item.product.images.first().map(|image| image.url.clone()),
                })
                .collect(),
            updates: order
                .tracking_updates
                .iter()
                .map(|update| TrackingUpdateView {
                    status: update.status.clone(),
                    location: update.location.clone(),
                    note: update.note.clone(),
                    timestamp: update.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                })
                .collect(),
        }
    }
}

/// Tracker display data.
#[derive(Clone, Default)]
pub struct TrackerDisplay {
    pub code: String,
    pub order: Option<OrderView>,
    pub error: Option<&'static str>,
}

impl TrackerDisplay {
    fn new(view: TrackerView, currency: CurrencyCode) -> Self {
        Self {
            code: view.code.unwrap_or_default(),
            order: view.order.as_ref().map(|order| OrderView::new(order, currency)),
            error: view.error.as_ref().map(|err| err.user_message()),
        }
    }
}

/// Tracking page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/track.html")]
pub struct TrackTemplate {
    pub tracker: TrackerDisplay,
}

/// Tracking result fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/order_result.html")]
pub struct OrderResultTemplate {
    pub tracker: TrackerDisplay,
}

/// Thank-you page template.
#[derive(Template, WebTemplate)]
#[template(path = "thank_you.html")]
pub struct ThankYouTemplate {
    pub order_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    #[serde(rename = "trackingId", alias = "tracking_id")]
    pub tracking_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrackForm {
    #[serde(default)]
    pub tracking_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ThankYouQuery {
    #[serde(rename = "orderId")]
    pub order_id: Option<String>,
}

/// Display the tracking page.
///
/// `?trackingId=` looks the code up before rendering, so tracking links
/// can be shared.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<TrackQuery>,
) -> Result<TrackTemplate> {
    let tracker = state.trackers().tracker(&visitor.id).await;

    if let Some(code) = query.tracking_id {
        tracker.track(&code).await;
    }

    Ok(TrackTemplate {
        tracker: TrackerDisplay::new(tracker.view(), state.config().store.currency),
    })
}

/// Look up an order (HTMX).
///
/// A lookup overtaken by a newer one from the same visitor answers with no
/// content and tells HTMX not to swap, so a stale result never replaces a
/// fresh one.
#[instrument(skip_all)]
pub async fn track(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<TrackForm>,
) -> Result<Response> {
    let tracker = state.trackers().tracker(&visitor.id).await;

    match tracker.track(&form.tracking_id).await {
        TrackOutcome::Superseded => Ok((
            StatusCode::NO_CONTENT,
            AppendHeaders([("HX-Reswap", "none")]),
        )
            .into_response()),
        TrackOutcome::Current(_) => Ok(OrderResultTemplate {
            tracker: TrackerDisplay::new(tracker.view(), state.config().store.currency),
        }
        .into_response()),
    }
}

/// Clear the tracking result (HTMX).
#[instrument(skip_all)]
pub async fn reset(State(state): State<AppState>, visitor: Visitor) -> Result<OrderResultTemplate> {
    let tracker = state.trackers().tracker(&visitor.id).await;
    tracker.reset();

    Ok(OrderResultTemplate {
        tracker: TrackerDisplay::default(),
    })
}

/// Order confirmation page.
pub async fn thank_you(Query(query): Query<ThankYouQuery>) -> Response {
    match query.order_id.filter(|id| !id.trim().is_empty()) {
        Some(order_id) => ThankYouTemplate { order_id }.into_response(),
        None => Redirect::to("/").into_response(),
    }
}
