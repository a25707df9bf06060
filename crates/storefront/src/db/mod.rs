//! Database connection for storefront `PostgreSQL`.
//!
//! The storefront keeps no domain data of its own: carts, orders and
//! customers belong to the store backend. `PostgreSQL` only backs the
//! `tower_sessions` table, which holds each visitor's cart, checkout draft
//! and pending-checkout flag across the sign-in redirect.
//!
//! # Migrations
//!
//! The session table is created via:
//! ```bash
//! cargo run -p rwaya-cli -- migrate sessions
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a `PostgreSQL` connection pool.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
