//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Extractors: [`Visitor`] (session plus stable visitor id) and
//! [`OptionalAuth`] (signed-in customer, if any).

pub mod auth;
pub mod request_id;
pub mod session;
pub mod visitor;

pub use auth::OptionalAuth;
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
pub use visitor::Visitor;
