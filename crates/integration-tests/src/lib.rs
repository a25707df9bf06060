//! Integration tests for the Rwaya storefront.
//!
//! Each test starts a real storefront server on an ephemeral port, wired to
//! an in-process mock of the store backend and identity provider. Sessions
//! live in memory, so no database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rwaya-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;

use rwaya_core::CurrencyCode;
use rwaya_storefront::config::{AuthConfig, PaymentConfig, StoreConfig, StorefrontConfig};
use rwaya_storefront::middleware::create_session_layer;
use rwaya_storefront::state::AppState;

/// Tracking ID the mock backend knows.
pub const KNOWN_TRACKING_ID: &str = "TRK-2026-0042";

/// Tracking ID the mock backend answers slowly (and does not know).
pub const SLOW_TRACKING_ID: &str = "TRK-SLOW-0001";

/// County the mock backend refuses to deliver to.
pub const UNDELIVERABLE_COUNTY: &str = "Atlantis";

/// Reason the mock backend gives for refusing a checkout.
pub const REJECTION_REASON: &str = "We do not deliver to this county yet";

/// Reference of every payment session the mock backend creates.
pub const SESSION_REFERENCE: &str = "ref_5c1d9a";

/// Account the mock identity provider signs everyone in as.
pub const ACCOUNT_EMAIL: &str = "amina@example.com";

// =============================================================================
// Mock Backend
// =============================================================================

#[derive(Clone, Default)]
struct BackendState {
    checkout_requests: Arc<Mutex<Vec<Value>>>,
}

#[derive(Deserialize)]
struct TrackQuery {
    #[serde(rename = "trackingId")]
    tracking_id: String,
}

#[derive(Deserialize)]
struct TokenForm {
    code: String,
}

async fn create_checkout(State(state): State<BackendState>, Json(body): Json<Value>) -> Response {
    state
        .checkout_requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(body.clone());

    if body["county"] == UNDELIVERABLE_COUNTY {
        return Json(json!({ "success": false, "error": REJECTION_REASON })).into_response();
    }

    // KSh 1,500.00 per unit, in minor units.
    let units: u64 = body["items"]
        .as_array()
        .map(|items| items.iter().filter_map(|i| i["quantity"].as_u64()).sum())
        .unwrap_or_default();

    Json(json!({
        "success": true,
        "email": body["customerEmail"],
        "amount": units * 150_000,
        "reference": SESSION_REFERENCE,
    }))
    .into_response()
}

async fn track_order(Query(query): Query<TrackQuery>) -> Response {
    if query.tracking_id == SLOW_TRACKING_ID {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    if query.tracking_id != KNOWN_TRACKING_ID {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "Order not found" }))).into_response();
    }

    Json(json!({
        "id": "ord_3f9a71b8e4",
        "customerName": "Amina Wanjiru",
        "phone": "0712345678",
        "address": "Moi Avenue 12",
        "county": "Nairobi",
        "customerEmail": ACCOUNT_EMAIL,
        "trackingId": KNOWN_TRACKING_ID,
        "deliveryStatus": "Processing",
        "isPaid": true,
        "createdAt": "2026-03-01T09:00:00Z",
        "updatedAt": "2026-03-03T16:30:00Z",
        "orderItems": [
            {
                "id": "item_1",
                "quantity": 2,
                "product": { "id": "kikoi-01", "name": "Kikoi Wrap", "price": "1500.00", "images": [] }
            }
        ],
        "trackingUpdates": [
            { "id": "u1", "status": "Order Confirmed", "timestamp": "2026-03-01T09:05:00Z" },
            { "id": "u2", "status": "Shipped", "location": "Nairobi Hub", "timestamp": "2026-03-02T08:00:00Z" },
            { "id": "u3", "status": "In Transit", "location": "Nakuru", "timestamp": "2026-03-03T16:30:00Z" }
        ]
    }))
    .into_response()
}

async fn exchange_token(Form(form): Form<TokenForm>) -> Response {
    if form.code.is_empty() {
        return (StatusCode::BAD_REQUEST, "invalid_grant").into_response();
    }
    Json(json!({ "access_token": "at_8d1e", "token_type": "Bearer", "expires_in": 3600 }))
        .into_response()
}

async fn userinfo() -> Json<Value> {
    Json(json!({ "sub": "cust_2291", "email": ACCOUNT_EMAIL }))
}

/// Mock store backend and identity provider.
pub struct MockBackend {
    pub url: String,
    state: BackendState,
}

impl MockBackend {
    async fn start() -> Self {
        let state = BackendState::default();
        let app = Router::new()
            .route("/api/checkout", post(create_checkout))
            .route("/api/orders/track", get(track_order))
            .route("/oauth/token", post(exchange_token))
            .route("/oauth/userinfo", get(userinfo))
            .with_state(state.clone());

        let addr = serve(app, bind().await).await;

        Self {
            url: format!("http://{addr}"),
            state,
        }
    }

    /// Bodies of every checkout request received so far.
    #[must_use]
    pub fn checkout_requests(&self) -> Vec<Value> {
        self.state
            .checkout_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

async fn bind() -> TcpListener {
    TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener")
}

async fn serve(app: Router, listener: TcpListener) -> SocketAddr {
    let addr = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Test server error");
    });
    addr
}

// =============================================================================
// Test Context
// =============================================================================

/// A running storefront with a browser-like client.
pub struct TestContext {
    /// Keeps cookies, does not follow redirects.
    pub client: Client,
    pub storefront_url: String,
    pub backend: MockBackend,
}

impl TestContext {
    /// Start the mock backend and a storefront pointed at it.
    pub async fn start() -> Self {
        let backend = MockBackend::start().await;

        let listener = bind().await;
        let storefront_url = format!(
            "http://{}",
            listener.local_addr().expect("Failed to read local address")
        );

        let config = config(&storefront_url, &backend.url);
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/rwaya_test")
            .expect("Failed to create lazy pool");
        let state = AppState::new(config.clone(), pool).expect("Failed to build state");
        let session_layer = create_session_layer(MemoryStore::default(), &config);

        serve(rwaya_storefront::build_app(state, session_layer), listener).await;

        let client = Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            storefront_url,
            backend,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn add_to_cart(&self, id: &str, quantity: &str) {
        let response = self
            .post_form(
                "/cart/add",
                &[
                    ("id", id),
                    ("name", "Kikoi Wrap"),
                    ("price", "1500"),
                    ("quantity", quantity),
                ],
            )
            .await;
        assert!(response.status().is_success(), "add to cart failed");
    }

    /// Follow an identity provider redirect as if the customer approved.
    pub async fn approve_sign_in(&self, authorize_url: &str) -> reqwest::Response {
        let url = url::Url::parse(authorize_url).expect("Invalid authorize URL");
        let state = url
            .query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .expect("Authorize URL without state");

        self.client
            .get(self.url("/auth/callback"))
            .query(&[("code", "code_77aa"), ("state", state.as_str())])
            .send()
            .await
            .expect("Callback request failed")
    }

    /// Sign in without a pending checkout.
    pub async fn sign_in(&self) {
        let redirect = self.get("/auth/sign-in?return_to=/cart").await;
        let response = self.approve_sign_in(&location(&redirect)).await;
        assert_eq!(location(&response), "/cart");
    }
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Checkout form fields for a valid submission.
#[must_use]
pub fn checkout_form(county: &str) -> Vec<(&'static str, String)> {
    vec![
        ("customer_name", "Amina Wanjiru".to_string()),
        ("customer_email", "typed@example.com".to_string()),
        ("phone", "0712345678".to_string()),
        ("address", "Moi Avenue 12".to_string()),
        ("county", county.to_string()),
        ("id_number", "12345678".to_string()),
        ("shipping_method", "standard".to_string()),
    ]
}

fn config(storefront_url: &str, backend_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/rwaya_test"),
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: storefront_url.to_string(),
        store: StoreConfig {
            api_url: format!("{backend_url}/api"),
            currency: CurrencyCode::KES,
            courier_surcharge: Decimal::new(300, 0),
        },
        payment: PaymentConfig {
            public_key: "pk_test_4b7e".to_string(),
            script_url: "https://js.paystack.co/v1/inline.js".to_string(),
        },
        auth: AuthConfig {
            client_id: "rwaya-web".to_string(),
            client_secret: SecretString::from("kq8Zr2vN5xT1mW7p"),
            authorize_url: format!("{backend_url}/oauth/authorize"),
            token_url: format!("{backend_url}/oauth/token"),
            userinfo_url: format!("{backend_url}/oauth/userinfo"),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}
