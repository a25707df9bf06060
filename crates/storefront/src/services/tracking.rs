//! Order tracking.
//!
//! [`OrderTracker`] looks up an order by tracking code and keeps what the
//! tracking page shows. Lookups are last-request-wins: every call takes a
//! ticket before its first await, and a response is only applied if no newer
//! ticket was issued in the meantime. A slow answer to an old query never
//! overwrites the answer to a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use rwaya_core::TrackingCode;

use crate::models::TrackedOrder;
use crate::store_api::{StoreApiError, TrackingApi};

pub const EMPTY_CODE_MESSAGE: &str = "Please enter a tracking ID";
pub const NOT_FOUND_MESSAGE: &str = "Order not found. Please check your tracking ID and try again.";

/// Errors from an order lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrackingError {
    /// Nothing to look up. Raised locally, no request is made.
    #[error("tracking code is empty")]
    Validation,

    /// The tracking API has no order for the code.
    #[error("order not found")]
    NotFound,

    /// Any other failure, transport or server.
    #[error("order lookup failed: {0}")]
    Lookup(String),
}

impl TrackingError {
    /// What the customer sees. Lookup failures are indistinguishable from
    /// a missing order.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Validation => EMPTY_CODE_MESSAGE,
            Self::NotFound | Self::Lookup(_) => NOT_FOUND_MESSAGE,
        }
    }
}

impl From<StoreApiError> for TrackingError {
    fn from(err: StoreApiError) -> Self {
        match err {
            StoreApiError::NotFound => Self::NotFound,
            other => Self::Lookup(other.to_string()),
        }
    }
}

/// Result of [`OrderTracker::track`].
#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    /// This was the newest lookup; the view now shows its result.
    Current(Result<TrackedOrder, TrackingError>),
    /// A newer lookup was issued while this one was in flight. Its result
    /// was discarded.
    Superseded,
}

/// What the tracking page currently displays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerView {
    /// The code that was looked up, trimmed.
    pub code: Option<String>,
    pub order: Option<TrackedOrder>,
    pub error: Option<TrackingError>,
}

/// Looks up orders and holds the latest result.
pub struct OrderTracker<T> {
    api: T,
    latest: AtomicU64,
    view: Mutex<TrackerView>,
}

impl<T: TrackingApi> OrderTracker<T> {
    #[must_use]
    pub fn new(api: T) -> Self {
        Self {
            api,
            latest: AtomicU64::new(0),
            view: Mutex::new(TrackerView::default()),
        }
    }

    /// Look up an order.
    ///
    /// Blank input is rejected without a request. The order's tracking
    /// updates are kept in the order the API returned them.
    #[instrument(skip_all, fields(tracking_code = %input.trim()))]
    pub async fn track(&self, input: &str) -> TrackOutcome {
        let ticket = self.next_ticket();

        let result = match TrackingCode::parse(input) {
            Err(_) => Err(TrackingError::Validation),
            Ok(code) => match self.api.fetch_order(&code).await {
                Ok(order) => Ok(TrackedOrder::new(order)),
                Err(StoreApiError::NotFound) => Err(TrackingError::NotFound),
                Err(err) => {
                    warn!(error = %err, "Order lookup failed");
                    Err(err.into())
                }
            },
        };

        self.apply(ticket, input.trim(), result)
    }

    /// Clear the display ("track another order").
    ///
    /// Any lookup still in flight is superseded.
    pub fn reset(&self) {
        let mut view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        self.next_ticket();
        *view = TrackerView::default();
    }

    /// Snapshot of the display state.
    #[must_use]
    pub fn view(&self) -> TrackerView {
        self.view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_ticket(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn apply(
        &self,
        ticket: u64,
        code: &str,
        result: Result<TrackedOrder, TrackingError>,
    ) -> TrackOutcome {
        let mut view = self.view.lock().unwrap_or_else(PoisonError::into_inner);

        if self.latest.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "Discarding superseded lookup");
            return TrackOutcome::Superseded;
        }

        *view = match &result {
            Ok(order) => TrackerView {
                code: Some(code.to_string()),
                order: Some(order.clone()),
                error: None,
            },
            Err(err) => TrackerView {
                code: Some(code.to_string()),
                order: None,
                error: Some(err.clone()),
            },
        };

        TrackOutcome::Current(result)
    }
}

/// One tracker per visitor, dropped after a period of inactivity.
#[derive(Clone)]
pub struct TrackerRegistry<T> {
    cache: Cache<String, Arc<OrderTracker<T>>>,
    api: T,
}

impl<T> TrackerRegistry<T>
where
    T: TrackingApi + Clone + 'static,
{
    #[must_use]
    pub fn new(api: T, idle_timeout: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(idle_timeout)
            .build();

        Self { cache, api }
    }

    /// The visitor's tracker, created on first use.
    pub async fn tracker(&self, visitor_id: &str) -> Arc<OrderTracker<T>> {
        self.cache
            .get_with(visitor_id.to_string(), async {
                Arc::new(OrderTracker::new(self.api.clone()))
            })
            .await
    }
}
