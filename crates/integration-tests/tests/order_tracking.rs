//! End-to-end order tracking.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use reqwest::StatusCode;
use rwaya_integration_tests::{KNOWN_TRACKING_ID, SLOW_TRACKING_ID, TestContext};

#[tokio::test]
async fn test_tracking_link_shows_timeline_in_order() {
    let ctx = TestContext::start().await;

    let response = ctx
        .get(&format!("/orders?trackingId={KNOWN_TRACKING_ID}"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = response.text().await.unwrap();

    assert!(page.contains("Order #71b8e4"), "{page}");
    assert!(page.contains("KSh 3,000.00"));

    let confirmed = page.find("Order Confirmed").unwrap();
    let shipped = page.find("Shipped").unwrap();
    let in_transit = page.rfind("In Transit").unwrap();
    assert!(confirmed < shipped && shipped < in_transit);
}

#[tokio::test]
async fn test_unknown_tracking_id_shows_not_found() {
    let ctx = TestContext::start().await;

    let response = ctx
        .post_form("/orders/track", &[("tracking_id", "TRK-0000")])
        .await;
    let fragment = response.text().await.unwrap();

    assert!(fragment.contains("Order not found"), "{fragment}");
}

#[tokio::test]
async fn test_reset_clears_result() {
    let ctx = TestContext::start().await;
    ctx.post_form("/orders/track", &[("tracking_id", KNOWN_TRACKING_ID)])
        .await;

    let fragment = ctx.post_form("/orders/reset", &[]).await.text().await.unwrap();
    assert!(!fragment.contains("Order #"));

    let page = ctx.get("/orders").await.text().await.unwrap();
    assert!(!page.contains("Order #"));
}

#[tokio::test]
async fn test_overtaken_lookup_does_not_swap() {
    let ctx = TestContext::start().await;
    ctx.get("/orders").await;

    let slow = {
        let client = ctx.client.clone();
        let url = ctx.url("/orders/track");
        tokio::spawn(async move {
            client
                .post(url)
                .form(&[("tracking_id", SLOW_TRACKING_ID)])
                .send()
                .await
                .unwrap()
        })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let fresh = ctx
        .post_form("/orders/track", &[("tracking_id", KNOWN_TRACKING_ID)])
        .await;
    assert_eq!(fresh.status(), StatusCode::OK);
    assert!(fresh.text().await.unwrap().contains("Order #71b8e4"));

    let stale = slow.await.unwrap();
    assert_eq!(stale.status(), StatusCode::NO_CONTENT);
    assert_eq!(stale.headers().get("HX-Reswap").unwrap(), "none");

    let page = ctx.get("/orders").await.text().await.unwrap();
    assert!(page.contains("Order #71b8e4"), "{page}");
}
