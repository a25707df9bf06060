//! Order lookup command.
//!
//! Uses the same tracker as the storefront's tracking page, so blank codes
//! are rejected before any request and the timeline is printed in the order
//! the store API returned it.
//!
//! # Environment Variables
//!
//! - `STORE_API_URL` - Base URL of the store backend API
//! - `STORE_CURRENCY` - Currency for amounts (default: KES)

use rwaya_core::Price;
use rwaya_storefront::config::{ConfigError, StoreConfig};
use rwaya_storefront::services::tracking::{OrderTracker, TrackOutcome, TrackingError};
use rwaya_storefront::store_api::BackendClient;

/// Errors from the track command.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{}", .0.user_message())]
    Lookup(TrackingError),
}

/// Look up an order and log its status and timeline.
///
/// # Errors
///
/// Returns an error if configuration is missing or the lookup fails.
pub async fn order(tracking_id: &str) -> Result<(), TrackError> {
    let _ = dotenvy::dotenv();

    let store = StoreConfig::from_env()?;
    let tracker = OrderTracker::new(BackendClient::new(&store));

    let tracked = match tracker.track(tracking_id).await {
        TrackOutcome::Current(Ok(tracked)) => tracked,
        TrackOutcome::Current(Err(err)) => return Err(TrackError::Lookup(err)),
        // Only one lookup is ever issued here.
        TrackOutcome::Superseded => return Ok(()),
    };

    let order = &tracked.order;
    tracing::info!("Order #{} ({})", tracked.short_number(), order.id);
    tracing::info!("  Status: {}", tracked.latest_status());
    tracing::info!("  Payment: {}", tracked.payment_label());
    tracing::info!(
        "  Total: {}",
        Price::new(tracked.total, store.currency).display()
    );
    tracing::info!(
        "  Deliver to: {}, {}, {}",
        order.customer_name,
        order.address,
        order.county
    );

    for item in &order.order_items {
        tracing::info!("  {} x {}", item.quantity, item.product.name);
    }

    if !tracked.has_updates() {
        tracing::info!("  No tracking updates yet");
    }
    for update in &order.tracking_updates {
        tracing::info!(
            "  {} {}{}",
            update.timestamp.format("%Y-%m-%d %H:%M"),
            update.status,
            update
                .location
                .as_deref()
                .map(|l| format!(" ({l})"))
                .unwrap_or_default()
        );
    }

    Ok(())
}
