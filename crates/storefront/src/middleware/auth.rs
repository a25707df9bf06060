//! Authentication extractors.
//!
//! Nothing in the storefront is behind a login wall: checkout starts the
//! sign-in itself when it needs an identity. Handlers that only want to show
//! who is signed in use [`OptionalAuth`].

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::models::{CustomerIdentity, session_keys};

/// Extractor that optionally gets the signed-in customer.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(OptionalAuth(customer): OptionalAuth) -> impl IntoResponse {
///     match customer {
///         Some(c) => format!("Signed in as {}", c.id),
///         None => "Guest".to_string(),
///     }
/// }
/// ```
pub struct OptionalAuth(pub Option<CustomerIdentity>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CustomerIdentity>(session_keys::CURRENT_CUSTOMER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(customer))
    }
}
