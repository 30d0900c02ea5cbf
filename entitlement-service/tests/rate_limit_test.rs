mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{test_config, token_for, TestApp};
use entitlement_service::models::MemberRole;
use serde_json::json;

fn throttled_app() -> TestApp {
    let mut config = test_config();
    config.rate_limit.max_requests = 2;
    config.rate_limit.window_ms = 60_000;
    let app = TestApp::build_from_config(config);
    app.store.insert_blank_company("C1");
    app.seed_member("u1", "C1", MemberRole::Admin);
    app
}

fn status_request(token: &str, client_ip: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("PUT")
        .uri("/subscription/status")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token));
    if let Some(ip) = client_ip {
        builder = builder.header("x-forwarded-for", ip);
    }
    builder
        .body(Body::from(
            json!({ "subscription_status": "active" }).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn requests_beyond_the_window_cap_are_throttled() {
    let app = throttled_app();
    let token = token_for("u1");

    for _ in 0..2 {
        let response = app.request(status_request(&token, Some("10.0.0.1"))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.request(status_request(&token, Some("10.0.0.1"))).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
}

#[tokio::test]
async fn clients_are_throttled_independently() {
    let app = throttled_app();
    let token = token_for("u1");

    for _ in 0..2 {
        let response = app.request(status_request(&token, Some("10.0.0.1"))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    let throttled = app.request(status_request(&token, Some("10.0.0.1"))).await;
    assert_eq!(throttled.status(), StatusCode::TOO_MANY_REQUESTS);

    // A different client address still has its own budget.
    let response = app.request(status_request(&token, Some("10.0.0.2"))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_client_identity_fails_open() {
    let app = throttled_app();
    let token = token_for("u1");

    // No forwarded header and no socket address on the request: the limiter
    // cannot attribute the traffic, so it admits it.
    for _ in 0..5 {
        let response = app.request(status_request(&token, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn webhook_path_is_not_throttled() {
    let mut config = test_config();
    config.rate_limit.max_requests = 1;
    let app = TestApp::build_from_config(config);

    let body = json!({
        "id": "evt_1",
        "type": "charge.refunded",
        "data": { "object": {} }
    })
    .to_string();
    let sig = common::sign_webhook(&body);

    for _ in 0..3 {
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/billing")
            .header("content-type", "application/json")
            .header("x-forwarded-for", "10.0.0.1")
            .header("stripe-signature", &sig)
            .body(Body::from(body.clone()))
            .unwrap();
        let response = app.request(request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
