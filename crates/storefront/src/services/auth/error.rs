//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during sign-in.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Reading or writing the session failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// HTTP request to the identity provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The identity provider rejected a request.
    #[error("identity provider error: {0}")]
    Provider(String),

    /// The provider redirected back with an error (e.g. the customer declined).
    #[error("sign-in denied: {0}")]
    Denied(String),

    /// The callback carried no authorization code.
    #[error("missing authorization code")]
    MissingCode,

    /// The callback state did not match the one stored in the session.
    #[error("invalid sign-in state")]
    InvalidState,

    /// A configured provider URL could not be parsed.
    #[error("invalid provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
