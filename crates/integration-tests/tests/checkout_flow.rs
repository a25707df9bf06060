//! End-to-end checkout flows: sign-in hop, payment hand-off and the
//! redirect markers the payment widget comes back with.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use rwaya_integration_tests::{
    ACCOUNT_EMAIL, REJECTION_REASON, SESSION_REFERENCE, TestContext, UNDELIVERABLE_COUNTY,
    checkout_form, location,
};

async fn body(response: reqwest::Response) -> String {
    response.text().await.expect("Failed to read response")
}

async fn cart_count(ctx: &TestContext) -> String {
    body(ctx.get("/cart/count").await).await
}

#[tokio::test]
async fn test_signed_out_checkout_resumes_after_sign_in() {
    let ctx = TestContext::start().await;
    ctx.add_to_cart("kikoi-01", "1").await;

    let form = checkout_form("Nairobi");
    let response = ctx.client.post(ctx.url("/checkout")).form(&form).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let authorize_url = location(&response);
    assert!(authorize_url.starts_with(&ctx.backend.url), "{authorize_url}");

    // Nothing is submitted before sign-in.
    assert!(ctx.backend.checkout_requests().is_empty());

    let response = ctx.approve_sign_in(&authorize_url).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cart");

    let page = body(ctx.get("/cart").await).await;
    assert!(page.contains("Complete your payment"), "{page}");
    assert!(page.contains(SESSION_REFERENCE));
    assert!(page.contains("KSh 1,500.00"));

    let requests = ctx.backend.checkout_requests();
    assert_eq!(requests.len(), 1);
    // The account email replaces the one typed into the form.
    assert_eq!(requests[0]["customerEmail"], ACCOUNT_EMAIL);
    assert_eq!(requests[0]["items"][0]["id"], "kikoi-01");
}

#[tokio::test]
async fn test_resume_happens_once() {
    let ctx = TestContext::start().await;
    ctx.add_to_cart("kikoi-01", "1").await;

    let form = checkout_form("Nairobi");
    let response = ctx.client.post(ctx.url("/checkout")).form(&form).send().await.unwrap();
    ctx.approve_sign_in(&location(&response)).await;

    ctx.get("/cart").await;
    let page = body(ctx.get("/cart").await).await;

    assert!(!page.contains("Complete your payment"));
    assert_eq!(ctx.backend.checkout_requests().len(), 1);
}

#[tokio::test]
async fn test_successful_payment_clears_cart() {
    let ctx = TestContext::start().await;
    ctx.sign_in().await;
    ctx.add_to_cart("kikoi-01", "2").await;

    let form = checkout_form("Nairobi");
    let response = ctx.client.post(ctx.url("/checkout")).form(&form).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = body(response).await;
    assert!(page.contains("KSh 3,000.00"), "{page}");
    // Signed in: the typed email is used.
    assert_eq!(
        ctx.backend.checkout_requests()[0]["customerEmail"],
        "typed@example.com"
    );

    let response = ctx.get("/cart?success=1").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cart");

    let page = body(ctx.get("/cart").await).await;
    assert!(page.contains("Payment received"), "{page}");
    assert!(page.contains("Your cart is empty"));
    assert!(cart_count(&ctx).await.contains(">0</span>"));
}

#[tokio::test]
async fn test_canceled_payment_keeps_cart() {
    let ctx = TestContext::start().await;
    ctx.sign_in().await;
    ctx.add_to_cart("kikoi-01", "2").await;

    let form = checkout_form("Nairobi");
    ctx.client.post(ctx.url("/checkout")).form(&form).send().await.unwrap();

    let response = ctx.get("/cart?canceled=1").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let page = body(ctx.get("/cart").await).await;
    assert!(page.contains("Payment was canceled"), "{page}");
    assert!(cart_count(&ctx).await.contains(">2</span>"));
}

#[tokio::test]
async fn test_replayed_success_marker_has_no_effect() {
    let ctx = TestContext::start().await;
    ctx.sign_in().await;
    ctx.add_to_cart("kikoi-01", "1").await;

    let form = checkout_form("Nairobi");
    ctx.client.post(ctx.url("/checkout")).form(&form).send().await.unwrap();
    ctx.get("/cart?success=1").await;

    ctx.add_to_cart("kikoi-02", "3").await;
    ctx.get("/cart?success=1").await;

    assert!(cart_count(&ctx).await.contains(">3</span>"));
}

#[tokio::test]
async fn test_navigating_away_abandons_payment() {
    let ctx = TestContext::start().await;
    ctx.sign_in().await;
    ctx.add_to_cart("kikoi-01", "1").await;

    let form = checkout_form("Nairobi");
    ctx.client.post(ctx.url("/checkout")).form(&form).send().await.unwrap();

    // Back on the cart without a marker: the hand-off is dropped.
    ctx.get("/cart").await;
    ctx.get("/cart?success=1").await;
    assert!(cart_count(&ctx).await.contains(">1</span>"));

    // A new checkout can start right away.
    let response = ctx.client.post(ctx.url("/checkout")).form(&form).send().await.unwrap();
    assert!(body(response).await.contains("Complete your payment"));
    assert_eq!(ctx.backend.checkout_requests().len(), 2);
}

#[tokio::test]
async fn test_invalid_details_make_no_request() {
    let ctx = TestContext::start().await;
    ctx.sign_in().await;
    ctx.add_to_cart("kikoi-01", "1").await;

    let mut form = checkout_form("Nairobi");
    form.retain(|(key, _)| *key != "phone");
    let response = ctx.client.post(ctx.url("/checkout")).form(&form).send().await.unwrap();

    let page = body(response).await;
    assert!(page.contains("Please enter your phone number"), "{page}");
    // The rest of the form is kept.
    assert!(page.contains("Moi Avenue 12"));
    assert!(ctx.backend.checkout_requests().is_empty());
}

#[tokio::test]
async fn test_backend_rejection_reason_is_shown() {
    let ctx = TestContext::start().await;
    ctx.sign_in().await;
    ctx.add_to_cart("kikoi-01", "1").await;

    let form = checkout_form(UNDELIVERABLE_COUNTY);
    let response = ctx.client.post(ctx.url("/checkout")).form(&form).send().await.unwrap();

    let page = body(response).await;
    assert!(page.contains(REJECTION_REASON), "{page}");
    assert!(cart_count(&ctx).await.contains(">1</span>"));
}

#[tokio::test]
async fn test_flash_survives_payment_page() {
    let ctx = TestContext::start().await;
    ctx.add_to_cart("kikoi-01", "1").await;
    let form = checkout_form("Nairobi");

    // First sign-in attempt is declined; the notice is stored but not shown yet.
    ctx.client.post(ctx.url("/checkout")).form(&form).send().await.unwrap();
    let response = ctx.get("/auth/callback?error=access_denied").await;
    assert_eq!(location(&response), "/cart");

    // Second attempt goes through and resumes straight into the payment page.
    let response = ctx.client.post(ctx.url("/checkout")).form(&form).send().await.unwrap();
    ctx.approve_sign_in(&location(&response)).await;
    let page = body(ctx.get("/cart").await).await;
    assert!(page.contains("Complete your payment"), "{page}");
    assert!(!page.contains("Sign-in was not completed"));

    // The next cart render delivers it, once.
    let page = body(ctx.get("/cart").await).await;
    assert!(page.contains("Sign-in was not completed"), "{page}");
    let page = body(ctx.get("/cart").await).await;
    assert!(!page.contains("Sign-in was not completed"));
}
