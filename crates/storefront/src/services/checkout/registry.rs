//! One checkout orchestrator per visitor.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{CheckoutError, CheckoutOrchestrator, CheckoutSettings};
use crate::services::payment::PaymentGateway;
use crate::store_api::CheckoutApi;

type Slot<C, P> = Arc<Mutex<CheckoutOrchestrator<C, P>>>;

/// Per-visitor orchestrators, dropped after a period of inactivity.
///
/// A visitor's orchestrator is only ever taken with `try_lock`: a second
/// request arriving while the first still holds it is rejected with
/// [`CheckoutError::InFlight`] rather than queued behind it.
#[derive(Clone)]
pub struct CheckoutRegistry<C, P> {
    cache: Cache<String, Slot<C, P>>,
    api: C,
    gateway: P,
    settings: Arc<CheckoutSettings>,
}

impl<C, P> CheckoutRegistry<C, P>
where
    C: CheckoutApi + Clone + 'static,
    P: PaymentGateway + Clone + 'static,
{
    #[must_use]
    pub fn new(api: C, gateway: P, settings: CheckoutSettings, idle_timeout: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(idle_timeout)
            .build();

        Self {
            cache,
            api,
            gateway,
            settings: Arc::new(settings),
        }
    }

    /// Take exclusive hold of the visitor's orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InFlight`] if another request holds it.
    pub async fn acquire(
        &self,
        visitor_id: &str,
    ) -> Result<OwnedMutexGuard<CheckoutOrchestrator<C, P>>, CheckoutError> {
        let slot = self
            .cache
            .get_with(visitor_id.to_string(), async {
                Arc::new(Mutex::new(CheckoutOrchestrator::new(
                    self.api.clone(),
                    self.gateway.clone(),
                    Arc::clone(&self.settings),
                )))
            })
            .await;

        slot.try_lock_owned().map_err(|_| CheckoutError::InFlight)
    }
}
