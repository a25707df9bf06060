//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::auth::{AuthError, SignInProvider};
use crate::services::checkout::{CheckoutRegistry, CheckoutSettings};
use crate::services::payment::InlineGateway;
use crate::services::tracking::TrackerRegistry;
use crate::store_api::BackendClient;

/// How long an idle visitor's checkout and tracking state is kept in memory.
const VISITOR_STATE_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Redirect targets the payment widget navigates to.
pub const PAYMENT_CALLBACK_URL: &str = "/cart?success=1";
pub const PAYMENT_CANCEL_URL: &str = "/cart?canceled=1";

/// Storefront checkout registry with the production capabilities.
pub type Checkouts = CheckoutRegistry<BackendClient, InlineGateway>;

/// Storefront tracker registry with the production capabilities.
pub type Trackers = TrackerRegistry<BackendClient>;

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid identity provider configuration: {0}")]
    Auth(#[from] AuthError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the session database pool and the per-visitor
/// checkout and tracking registries.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    sign_in: SignInProvider,
    checkouts: Checkouts,
    trackers: Trackers,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the identity provider configuration is invalid.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let store_api = BackendClient::new(&config.store);
        let sign_in = SignInProvider::new(&config.auth)?;

        let settings = CheckoutSettings {
            public_key: config.payment.public_key.clone(),
            courier_surcharge: config.store.courier_surcharge,
            callback_url: PAYMENT_CALLBACK_URL.to_string(),
            cancel_url: PAYMENT_CANCEL_URL.to_string(),
        };
        let checkouts = CheckoutRegistry::new(
            store_api.clone(),
            InlineGateway::new(config.payment.script_url.clone()),
            settings,
            VISITOR_STATE_IDLE_TIMEOUT,
        );
        let trackers = TrackerRegistry::new(store_api, VISITOR_STATE_IDLE_TIMEOUT);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                sign_in,
                checkouts,
                trackers,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the identity provider client.
    #[must_use]
    pub fn sign_in(&self) -> &SignInProvider {
        &self.inner.sign_in
    }

    #[must_use]
    pub fn checkouts(&self) -> &Checkouts {
        &self.inner.checkouts
    }

    #[must_use]
    pub fn trackers(&self) -> &Trackers {
        &self.inner.trackers
    }
}
