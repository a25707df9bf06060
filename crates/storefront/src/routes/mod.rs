//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to the cart
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (session database)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page (also applies ?success=1 / ?canceled=1)
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! POST /cart/clear             - Empty the cart (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! POST /checkout               - Start checkout (sign-in redirect or payment page)
//! GET  /thank-you              - Order confirmation (?orderId=)
//!
//! # Order tracking
//! GET  /orders                 - Tracking page (?trackingId= looks up directly)
//! POST /orders/track           - Look up an order (returns order_result fragment)
//! POST /orders/reset           - Clear the result (returns order_result fragment)
//!
//! # Auth
//! GET  /auth/sign-in           - Redirect to the identity provider
//! GET  /auth/callback          - Identity provider callback
//! POST /auth/sign-out          - Sign out
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod orders;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the order tracking routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::show))
        .route("/track", post(orders::track))
        .route("/reset", post(orders::reset))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-in", get(auth::sign_in))
        .route("/callback", get(auth::callback))
        .route("/sign-out", post(auth::sign_out))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/cart") }))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::submit))
        .route("/thank-you", get(orders::thank_you))
        .nest("/orders", order_routes())
        .nest("/auth", auth_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{HeaderMap, Request, StatusCode, header},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use crate::config::tests::config;
    use crate::middleware::create_session_layer;
    use crate::services::checkout::validation::EMPTY_CART;
    use crate::services::tracking::EMPTY_CODE_MESSAGE;

    use super::*;

    /// Test browser: keeps the session cookie between requests.
    struct Browser {
        app: Router,
        cookie: Option<String>,
    }

    struct Reply {
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    }

    impl Reply {
        fn location(&self) -> &str {
            self.headers
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
        }
    }

    impl Browser {
        fn new() -> Self {
            let config = config("http://localhost:3000");
            let pool = PgPoolOptions::new()
                .connect_lazy("postgres://localhost/rwaya")
                .unwrap();
            let state = AppState::new(config.clone(), pool).unwrap();
            let layer = create_session_layer(MemoryStore::default(), &config);

            Self {
                app: crate::build_app(state, layer),
                cookie: None,
            }
        }

        async fn get(&mut self, uri: &str) -> Reply {
            let request = Request::get(uri);
            self.send(request, Body::empty()).await
        }

        async fn post(&mut self, uri: &str, form: &str) -> Reply {
            let request = Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
            self.send(request, Body::from(form.to_string())).await
        }

        async fn send(&mut self, mut request: axum::http::request::Builder, body: Body) -> Reply {
            if let Some(cookie) = &self.cookie {
                request = request.header(header::COOKIE, cookie);
            }

            let response = self
                .app
                .clone()
                .oneshot(request.body(body).unwrap())
                .await
                .unwrap();

            if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
                let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
                self.cookie = Some(pair.to_string());
            }

            let status = response.status();
            let headers = response.headers().clone();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();

            Reply {
                status,
                headers,
                body: String::from_utf8(bytes.to_vec()).unwrap(),
            }
        }
    }

    const CHECKOUT_FORM: &str = "customer_name=Amina+Wanjiru&customer_email=amina%40example.com\
        &phone=0712345678&address=Moi+Avenue+12&county=Nairobi&id_number=12345678\
        &shipping_method=standard";

    #[tokio::test]
    async fn test_root_redirects_to_cart() {
        let mut browser = Browser::new();

        let reply = browser.get("/").await;

        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.location(), "/cart");
    }

    #[tokio::test]
    async fn test_health() {
        let mut browser = Browser::new();

        let reply = browser.get("/health").await;

        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, "ok");
    }

    #[tokio::test]
    async fn test_empty_cart_page() {
        let mut browser = Browser::new();

        let reply = browser.get("/cart").await;

        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains("Your cart is empty"));
    }

    #[tokio::test]
    async fn test_add_to_cart_updates_count() {
        let mut browser = Browser::new();

        let reply = browser
            .post("/cart/add", "id=kikoi-01&name=Kikoi&price=1500&quantity=2")
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.headers.get("HX-Trigger").unwrap(), "cart-updated");

        // Adding the same id again is a no-op.
        browser
            .post("/cart/add", "id=kikoi-01&name=Kikoi&price=1500&quantity=5")
            .await;

        let reply = browser.get("/cart/count").await;
        assert!(reply.body.contains(">2</span>"), "{}", reply.body);
    }

    #[tokio::test]
    async fn test_add_rejects_oversized_price() {
        let mut browser = Browser::new();

        let reply = browser
            .post(
                "/cart/add",
                "id=kikoi-01&name=Kikoi&price=79228162514264337593543950335&quantity=2",
            )
            .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);

        let reply = browser.get("/cart").await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains("Your cart is empty"));

        let reply = browser.post("/checkout", CHECKOUT_FORM).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains(EMPTY_CART));
    }

    #[tokio::test]
    async fn test_add_rejects_negative_price() {
        let mut browser = Browser::new();

        let reply = browser
            .post("/cart/add", "id=kikoi-01&name=Kikoi&price=-1500")
            .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);

        let reply = browser.get("/cart/count").await;
        assert!(reply.body.contains(">0</span>"), "{}", reply.body);
    }

    #[tokio::test]
    async fn test_update_rejects_zero_quantity() {
        let mut browser = Browser::new();
        browser
            .post("/cart/add", "id=kikoi-01&name=Kikoi&price=1500")
            .await;

        let reply = browser.post("/cart/update", "id=kikoi-01&quantity=0").await;
        assert!(reply.body.contains("Quantity must be at least 1"));

        let reply = browser.get("/cart/count").await;
        assert!(reply.body.contains(">1</span>"), "{}", reply.body);
    }

    #[tokio::test]
    async fn test_checkout_with_empty_cart_shows_notice() {
        let mut browser = Browser::new();

        let reply = browser.post("/checkout", CHECKOUT_FORM).await;

        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains(EMPTY_CART));
    }

    #[tokio::test]
    async fn test_signed_out_checkout_redirects_to_sign_in() {
        let mut browser = Browser::new();
        browser
            .post("/cart/add", "id=kikoi-01&name=Kikoi&price=1500")
            .await;

        let reply = browser.post("/checkout", CHECKOUT_FORM).await;

        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert!(
            reply
                .location()
                .starts_with("https://id.example.com/oauth/authorize?"),
            "{}",
            reply.location()
        );
        assert!(reply.location().contains("client_id=rwaya-web"));
    }

    #[tokio::test]
    async fn test_marker_without_open_payment_is_ignored() {
        let mut browser = Browser::new();
        browser
            .post("/cart/add", "id=kikoi-01&name=Kikoi&price=1500&quantity=3")
            .await;

        let reply = browser.get("/cart?success=1").await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.location(), "/cart");

        let reply = browser.get("/cart/count").await;
        assert!(reply.body.contains(">3</span>"), "{}", reply.body);
    }

    #[tokio::test]
    async fn test_declined_sign_in_returns_to_cart_with_notice() {
        let mut browser = Browser::new();

        let reply = browser.get("/auth/callback?error=access_denied").await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.location(), "/cart");

        let reply = browser.get("/cart").await;
        assert!(reply.body.contains("Sign-in was not completed"));

        // Flash notices show once.
        let reply = browser.get("/cart").await;
        assert!(!reply.body.contains("Sign-in was not completed"));
    }

    #[tokio::test]
    async fn test_callback_without_state_is_rejected() {
        let mut browser = Browser::new();

        let reply = browser.get("/auth/callback?code=abc").await;

        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blank_tracking_code_is_rejected_locally() {
        let mut browser = Browser::new();

        let reply = browser.post("/orders/track", "tracking_id=+++").await;

        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains(EMPTY_CODE_MESSAGE));
    }

    #[tokio::test]
    async fn test_thank_you_requires_order_id() {
        let mut browser = Browser::new();

        let reply = browser.get("/thank-you").await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.location(), "/");

        let reply = browser.get("/thank-you?orderId=ord_71b8e4").await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.contains("ord_71b8e4"));
    }
}
