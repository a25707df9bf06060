//! Authentication route handlers.
//!
//! Sign-in is delegated to the identity provider (authorization code flow).
//! Checkout starts it on its own when it needs an identity; these routes
//! also let a customer sign in or out explicitly.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::Visitor;
use crate::models::{Notice, session_keys};
use crate::services::auth::{AuthError, AuthGateway, DEFAULT_RETURN_TO, SessionAuth};
use crate::services::pending::{PendingIntentStore, SessionIntentStore};
use crate::state::AppState;

const SIGN_IN_NOT_COMPLETED: &str = "Sign-in was not completed. Your cart has been kept.";

/// Query parameters for `GET /auth/sign-in`.
#[derive(Debug, Deserialize)]
pub struct SignInQuery {
    pub return_to: Option<String>,
}

/// Query parameters the identity provider sends back.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

fn session_auth(state: &AppState, visitor: &Visitor) -> SessionAuth {
    SessionAuth::new(
        visitor.session.clone(),
        state.sign_in().clone(),
        &state.config().base_url,
    )
}

/// Redirect to the identity provider.
///
/// # Route
///
/// `GET /auth/sign-in`
#[instrument(skip_all)]
pub async fn sign_in(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<SignInQuery>,
) -> Result<Response> {
    let return_to = query.return_to.as_deref().unwrap_or(DEFAULT_RETURN_TO);
    let redirect = session_auth(&state, &visitor).sign_in(return_to).await?;

    Ok(Redirect::to(&redirect.url).into_response())
}

/// Handle the identity provider callback.
///
/// On success the customer lands back where sign-in was started from
/// (the cart, for checkout), which resumes a pending checkout. A declined
/// sign-in drops the pending checkout so it does not resume later.
///
/// # Route
///
/// `GET /auth/callback`
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        warn!(%error, %description, "Sign-in declined at the identity provider");

        let pending = SessionIntentStore::new(visitor.session.clone());
        if pending.consume().await? {
            info!("Pending checkout dropped");
        }
        visitor
            .session
            .insert(session_keys::FLASH_NOTICE, Notice::info(SIGN_IN_NOT_COMPLETED))
            .await?;

        return Ok(Redirect::to(DEFAULT_RETURN_TO).into_response());
    }

    let code = query.code.ok_or(AuthError::MissingCode)?;
    let returned_state = query.state.ok_or(AuthError::InvalidState)?;

    let (identity, return_to) = session_auth(&state, &visitor)
        .complete_sign_in(&code, &returned_state)
        .await?;

    set_sentry_user(&identity.id, identity.email.as_ref().map(|e| e.as_str()));
    add_breadcrumb("auth", "Customer signed in", None);
    info!(customer_id = %identity.id, "Customer signed in");

    Ok(Redirect::to(&return_to).into_response())
}

/// Sign out.
///
/// # Route
///
/// `POST /auth/sign-out`
#[instrument(skip_all)]
pub async fn sign_out(State(state): State<AppState>, visitor: Visitor) -> Result<Response> {
    session_auth(&state, &visitor).sign_out().await?;
    clear_sentry_user();

    Ok(Redirect::to(DEFAULT_RETURN_TO).into_response())
}
