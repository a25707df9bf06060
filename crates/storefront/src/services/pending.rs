//! Pending checkout flag.
//!
//! Set right before the sign-in redirect, consumed exactly once on the first
//! authenticated cart render afterwards. The sign-in hop is a full
//! navigation, so the session implementation is the one the storefront uses.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tower_sessions::Session;

use crate::models::session_keys;

/// Failure reading or writing the backing storage.
#[derive(Debug, Error)]
pub enum IntentStoreError {
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// A single durable boolean with set / read / read-and-clear.
pub trait PendingIntentStore: Send + Sync {
    /// Raise the flag.
    fn set(&self) -> impl Future<Output = Result<(), IntentStoreError>> + Send;

    /// Whether the flag is raised.
    fn is_set(&self) -> impl Future<Output = Result<bool, IntentStoreError>> + Send;

    /// Clear the flag and return whether it was raised.
    ///
    /// A second call returns `false`.
    fn consume(&self) -> impl Future<Output = Result<bool, IntentStoreError>> + Send;
}

/// Flag stored in the visitor session under `pending_checkout`.
#[derive(Clone)]
pub struct SessionIntentStore {
    session: Session,
}

impl SessionIntentStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl PendingIntentStore for SessionIntentStore {
    async fn set(&self) -> Result<(), IntentStoreError> {
        self.session
            .insert(session_keys::PENDING_CHECKOUT, true)
            .await?;
        Ok(())
    }

    async fn is_set(&self) -> Result<bool, IntentStoreError> {
        let flag = self
            .session
            .get::<bool>(session_keys::PENDING_CHECKOUT)
            .await?;
        Ok(flag.unwrap_or(false))
    }

    async fn consume(&self) -> Result<bool, IntentStoreError> {
        // `remove` hands back the previous value, so read and clear is one
        // operation on the session record.
        let flag = self
            .session
            .remove::<bool>(session_keys::PENDING_CHECKOUT)
            .await?;
        Ok(flag.unwrap_or(false))
    }
}

/// In-process flag.
#[derive(Debug, Default)]
pub struct MemoryIntentStore {
    flag: AtomicBool,
}

impl MemoryIntentStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }
}

impl PendingIntentStore for MemoryIntentStore {
    async fn set(&self) -> Result<(), IntentStoreError> {
        self.flag.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn is_set(&self) -> Result<bool, IntentStoreError> {
        Ok(self.flag.load(Ordering::SeqCst))
    }

    async fn consume(&self) -> Result<bool, IntentStoreError> {
        Ok(self.flag.swap(false, Ordering::SeqCst))
    }
}
