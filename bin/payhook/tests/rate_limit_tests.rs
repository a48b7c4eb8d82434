mod common;

use axum_test::TestServer;
use common::{create_test_app, create_test_app_state_with, test_config, SIGNATURE_HEADER};
use http::StatusCode;
use payhook_primitives::models::config::AppEnv;
use payhook_primitives::models::dtos::monitor_dto::WebhookLogQuery;
use payhook_primitives::models::entities::enum_types::WebhookOutcome;
use serde_json::Value;
use std::time::Duration;

#[tokio::test]
async fn limit_trips_on_the_next_request_and_recovers() {
    let mut config = test_config(AppEnv::Test);
    config.limit_details.rate_limit_max_requests = 3;
    config.limit_details.rate_limit_window_secs = 1;
    let state = create_test_app_state_with(config);
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    // Unsigned deliveries: rejected at the signature stage, but every one
    // counts against the source's window.
    for _ in 0..3 {
        let response = server.post("/webhook").bytes(b"{}".to_vec().into()).await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    let limited = server.post("/webhook").bytes(b"{}".to_vec().into()).await;
    assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().contains_key("retry-after"));
    let ack: Value = limited.json();
    assert_eq!(ack["success"], false);
    assert_eq!(ack["error"], "Rate limit exceeded");
    assert!(ack["retry_after"].as_u64().unwrap() >= 1);

    let rate_limited_entries = state
        .stores
        .webhook_logs
        .list(&WebhookLogQuery {
            outcome: Some(WebhookOutcome::RateLimited),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rate_limited_entries.len(), 1);

    // The window elapses and the same source is welcome again.
    tokio::time::sleep(Duration::from_millis(1200)).await;
    let recovered = server.post("/webhook").bytes(b"{}".to_vec().into()).await;
    assert_eq!(recovered.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn sources_are_limited_independently() {
    let mut config = test_config(AppEnv::Test);
    config.limit_details.rate_limit_max_requests = 2;
    config.limit_details.rate_limit_window_secs = 60;
    let state = create_test_app_state_with(config);
    let server = TestServer::new(create_test_app(state)).unwrap();

    for _ in 0..2 {
        let response = server
            .post("/webhook")
            .add_header("x-forwarded-for", "10.0.0.1")
            .bytes(b"{}".to_vec().into())
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    let limited = server
        .post("/webhook")
        .add_header("x-forwarded-for", "10.0.0.1")
        .bytes(b"{}".to_vec().into())
        .await;
    assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);

    // A different source still fits in its own window.
    let other = server
        .post("/webhook")
        .add_header("x-forwarded-for", "10.0.0.2")
        .bytes(b"{}".to_vec().into())
        .await;
    assert_eq!(other.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn production_rejects_unlisted_sources() {
    let state = create_test_app_state_with(test_config(AppEnv::Production));
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let response = server
        .post("/webhook")
        .add_header("x-forwarded-for", "1.2.3.4")
        .bytes(b"{}".to_vec().into())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let ack: Value = response.json();
    assert_eq!(ack["success"], false);
    assert_eq!(ack["error"], "Source not allowed: 1.2.3.4");

    let entries = state
        .stores
        .webhook_logs
        .list(&WebhookLogQuery::default())
        .await
        .unwrap();
    assert_eq!(entries[0].outcome, WebhookOutcome::RejectedSource);
}

#[tokio::test]
async fn production_accepts_gateway_ranges_and_loopback() {
    let state = create_test_app_state_with(test_config(AppEnv::Production));
    let server = TestServer::new(create_test_app(state)).unwrap();

    for source in ["196.33.252.100", "41.203.154.50", "127.0.0.1"] {
        let response = server
            .post("/webhook")
            .add_header("x-forwarded-for", source)
            .bytes(b"{}".to_vec().into())
            .await;

        // Past the source filter; rejected at the signature stage instead.
        assert_eq!(response.status_code(), StatusCode::OK);
        let ack: Value = response.json();
        assert_eq!(ack["error"], "Missing webhook signature header");
    }
}

#[tokio::test]
async fn signature_header_name_is_config_driven() {
    let mut config = test_config(AppEnv::Test);
    config.gateway_details.signature_header = "x-custom-signature".to_string();
    let state = create_test_app_state_with(config);
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    common::seed_order(&state, "INV-100", 10000).await;
    let body = common::webhook_body("INV-100", "Approved", "10000");

    // The default header name is no longer read...
    let response = server
        .post("/webhook")
        .add_header(SIGNATURE_HEADER, common::sign_body(&body))
        .bytes(body.clone().into())
        .await;
    let ack: Value = response.json();
    assert_eq!(ack["success"], false);

    // ...but the configured one is.
    let response = server
        .post("/webhook")
        .add_header("x-custom-signature", common::sign_body(&body))
        .bytes(body.into())
        .await;
    let ack: Value = response.json();
    assert_eq!(ack["success"], true);
}
