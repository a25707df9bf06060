//! HTTP client for the store backend.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CACHE_CONTROL, PRAGMA};
use tracing::{debug, instrument, warn};

use rwaya_core::{CurrencyCode, TrackingCode};

use super::conversions::{checkout_request, convert_order};
use super::types::{CheckoutResponse, ErrorResponse, OrderResponse};
use super::{CheckoutApi, StoreApiError, TrackingApi};
use crate::config::StoreConfig;
use crate::models::{CheckoutIntent, Order, PaymentSession};

/// Longest slice of a response body copied into an error or log line.
const BODY_SNIPPET_LEN: usize = 500;

/// Client for the store backend API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    endpoint: String,
    currency: CurrencyCode,
}

impl BackendClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            inner: Arc::new(BackendClientInner {
                client: reqwest::Client::new(),
                endpoint: config.api_url.trim_end_matches('/').to_string(),
                currency: config.currency,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.endpoint)
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_LEN).collect()
}

impl CheckoutApi for BackendClient {
    #[instrument(skip(self, intent), fields(items = intent.lines.len(), shipping = %intent.shipping_method))]
    async fn create_session(&self, intent: &CheckoutIntent) -> Result<PaymentSession, StoreApiError> {
        let response = self
            .inner
            .client
            .post(self.url("/checkout"))
            .header(ACCEPT, "application/json")
            .json(&checkout_request(intent))
            .send()
            .await
            .map_err(|e| StoreApiError::Network(e.to_string()))?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(
                status = %status,
                body = %snippet(&body),
                "Checkout API returned non-success status"
            );
            // Some failures still carry `{success: false, error}`.
            if let Ok(ErrorResponse { error, .. }) = serde_json::from_str(&body) {
                return Err(StoreApiError::Rejected(error));
            }
            return Err(StoreApiError::Api {
                status: status.as_u16(),
                message: snippet(&body),
            });
        }

        let parsed: CheckoutResponse = serde_json::from_str(&body)?;

        if !parsed.success {
            let reason = parsed
                .error
                .unwrap_or_else(|| "Checkout failed".to_string());
            return Err(StoreApiError::Rejected(reason));
        }

        let (Some(reference), Some(amount)) = (parsed.reference, parsed.amount) else {
            return Err(StoreApiError::Api {
                status: status.as_u16(),
                message: "success response without reference or amount".to_string(),
            });
        };

        debug!(reference = %reference, amount, "Payment session created");

        Ok(PaymentSession {
            reference,
            amount,
            currency: self.inner.currency,
            customer_email: parsed
                .email
                .unwrap_or_else(|| intent.customer_email.to_string()),
        })
    }
}

impl TrackingApi for BackendClient {
    #[instrument(skip(self), fields(tracking_code = %code))]
    async fn fetch_order(&self, code: &TrackingCode) -> Result<Order, StoreApiError> {
        let response = self
            .inner
            .client
            .get(self.url("/orders/track"))
            .query(&[("trackingId", code.as_str())])
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| StoreApiError::Network(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(StoreApiError::NotFound);
        }

        let body = response.text().await?;

        if !status.is_success() {
            warn!(
                status = %status,
                body = %snippet(&body),
                "Tracking API returned non-success status"
            );
            return Err(StoreApiError::Api {
                status: status.as_u16(),
                message: snippet(&body),
            });
        }

        let order: OrderResponse = serde_json::from_str(&body).inspect_err(|e| {
            warn!(error = %e, body = %snippet(&body), "Failed to parse order response");
        })?;

        convert_order(order)
    }
}
