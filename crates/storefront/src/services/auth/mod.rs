//! Customer authentication.
//!
//! Identity lives with a hosted OAuth provider. Checkout only needs two
//! things from it, expressed by [`AuthGateway`]: who the current customer is,
//! and a way to send them off to sign in. [`SessionAuth`] implements that for
//! one request on top of the visitor session and [`SignInProvider`].

mod error;
mod provider;

pub use error::AuthError;
pub use provider::{SignInProvider, TokenResponse};

use std::future::Future;

use rand::Rng;
use rand::distr::Alphanumeric;
use tower_sessions::Session;
use tracing::instrument;

use crate::models::{CustomerIdentity, session_keys};

/// Path the OAuth provider redirects back to.
pub const CALLBACK_PATH: &str = "/auth/callback";

/// Where to send the customer after sign-in when no return path was stored.
pub const DEFAULT_RETURN_TO: &str = "/cart";

const STATE_LENGTH: usize = 32;

/// A pending redirect to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInRedirect {
    pub url: String,
}

/// What checkout needs from authentication.
pub trait AuthGateway: Send + Sync {
    /// The signed-in customer, if any.
    fn current_identity(
        &self,
    ) -> impl Future<Output = Result<Option<CustomerIdentity>, AuthError>> + Send;

    /// Start a sign-in that comes back to `return_to` when it completes.
    ///
    /// The calling flow is suspended: the caller must hand the returned
    /// redirect to the browser and do nothing else.
    fn sign_in(
        &self,
        return_to: &str,
    ) -> impl Future<Output = Result<SignInRedirect, AuthError>> + Send;
}

/// Session-backed [`AuthGateway`] for one request.
#[derive(Clone)]
pub struct SessionAuth {
    session: Session,
    provider: SignInProvider,
    redirect_uri: String,
}

impl SessionAuth {
    /// # Arguments
    ///
    /// * `session` - The visitor session
    /// * `provider` - Identity provider client
    /// * `base_url` - Public storefront URL, used to build the callback URL
    #[must_use]
    pub fn new(session: Session, provider: SignInProvider, base_url: &str) -> Self {
        Self {
            session,
            provider,
            redirect_uri: callback_url(base_url),
        }
    }

    /// Finish a sign-in from the provider callback.
    ///
    /// Validates and clears the one-time state, exchanges the code, stores
    /// the identity, and returns it together with the path to go back to.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidState`] if the state does not match,
    /// and provider or session errors otherwise.
    #[instrument(skip_all)]
    pub async fn complete_sign_in(
        &self,
        code: &str,
        returned_state: &str,
    ) -> Result<(CustomerIdentity, String), AuthError> {
        // One-time use: removed whether or not it matches.
        let stored_state = self
            .session
            .remove::<String>(session_keys::AUTH_STATE)
            .await?;

        if stored_state.as_deref() != Some(returned_state) {
            return Err(AuthError::InvalidState);
        }

        let token = self
            .provider
            .exchange_code(code, &self.redirect_uri)
            .await?;
        let identity = self.provider.fetch_identity(&token.access_token).await?;

        self.session
            .insert(session_keys::CURRENT_CUSTOMER, &identity)
            .await?;

        let return_to = self
            .session
            .remove::<String>(session_keys::AUTH_RETURN_TO)
            .await?
            .unwrap_or_else(|| DEFAULT_RETURN_TO.to_string());

        Ok((identity, return_to))
    }

    /// Forget the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.session
            .remove::<CustomerIdentity>(session_keys::CURRENT_CUSTOMER)
            .await?;
        Ok(())
    }
}

impl AuthGateway for SessionAuth {
    async fn current_identity(&self) -> Result<Option<CustomerIdentity>, AuthError> {
        Ok(self.session.get(session_keys::CURRENT_CUSTOMER).await?)
    }

    async fn sign_in(&self, return_to: &str) -> Result<SignInRedirect, AuthError> {
        let state = random_state();

        self.session
            .insert(session_keys::AUTH_STATE, &state)
            .await?;
        self.session
            .insert(session_keys::AUTH_RETURN_TO, safe_return_path(return_to))
            .await?;

        Ok(SignInRedirect {
            url: self.provider.authorization_url(&self.redirect_uri, &state),
        })
    }
}

/// The absolute callback URL for a storefront base URL.
#[must_use]
pub fn callback_url(base_url: &str) -> String {
    format!("{}{CALLBACK_PATH}", base_url.trim_end_matches('/'))
}

/// Only local absolute paths are accepted as return targets.
fn safe_return_path(path: &str) -> &str {
    if path.starts_with('/') && !path.starts_with("//") {
        path
    } else {
        DEFAULT_RETURN_TO
    }
}

fn random_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}
