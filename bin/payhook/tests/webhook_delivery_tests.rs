mod common;

use axum_test::TestServer;
use common::{
    create_test_app, create_test_app_state, deliver, seed_order, sign_body, webhook_body,
    webhook_body_with_tx, SIGNATURE_HEADER,
};
use http::StatusCode;
use payhook_primitives::models::dtos::monitor_dto::WebhookLogQuery;
use payhook_primitives::models::entities::enum_types::{
    OrderStatus, PaymentStatus, WebhookOutcome,
};
use serde_json::{json, Value};

#[tokio::test]
async fn approved_payment_marks_order_paid() {
    let state = create_test_app_state();
    let order = seed_order(&state, "INV-001", 10000).await;
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let body = webhook_body_with_tx("INV-001", "Approved", "10000", "TX-1");
    let (status, ack) = deliver(&server, &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["success"], true);
    assert!(ack["webhook_id"].is_string());

    let updated = state
        .stores
        .orders
        .find_by_id(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Paid);
    assert_eq!(updated.order_status, OrderStatus::Active);
    assert_eq!(updated.gateway_transaction_id.as_deref(), Some("TX-1"));
    assert!(updated.paid_at.is_some());
}

#[tokio::test]
async fn identical_redeliveries_apply_exactly_once() {
    let state = create_test_app_state();
    let order = seed_order(&state, "INV-002", 10000).await;
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let body = webhook_body_with_tx("INV-002", "Approved", "10000", "TX-2");

    let mut processed = 0;
    let mut duplicates = 0;
    for _ in 0..3 {
        let (status, ack) = deliver(&server, &body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack["success"], true);
        if ack["message"] == "Duplicate webhook, already processed" {
            duplicates += 1;
        } else {
            processed += 1;
        }
    }
    assert_eq!(processed, 1);
    assert_eq!(duplicates, 2);

    let updated = state
        .stores
        .orders
        .find_by_id(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Paid);

    let logged = state
        .stores
        .webhook_logs
        .list(&WebhookLogQuery::default())
        .await
        .unwrap();
    let processed_entries = logged
        .iter()
        .filter(|e| e.outcome == WebhookOutcome::Processed)
        .count();
    let duplicate_entries = logged
        .iter()
        .filter(|e| e.outcome == WebhookOutcome::Duplicate)
        .count();
    assert_eq!(processed_entries, 1);
    assert_eq!(duplicate_entries, 2);
}

#[tokio::test]
async fn distinct_charge_attempts_are_distinct_events() {
    let state = create_test_app_state();
    let order = seed_order(&state, "INV-003", 10000).await;
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    // A declined attempt, then a successful retry with a new transaction id.
    let declined = webhook_body_with_tx("INV-003", "Declined", "10000", "TX-3a");
    let (_, ack) = deliver(&server, &declined).await;
    assert_eq!(ack["success"], true);

    let approved = webhook_body_with_tx("INV-003", "Approved", "10000", "TX-3b");
    let (_, ack) = deliver(&server, &approved).await;
    assert_eq!(ack["success"], true);
    assert_eq!(ack["message"], "Webhook processed successfully");

    let updated = state
        .stores
        .orders
        .find_by_id(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn tampered_body_is_rejected_with_200() {
    let state = create_test_app_state();
    seed_order(&state, "INV-004", 10000).await;
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let body = webhook_body("INV-004", "Approved", "10000");
    let signature = sign_body(&body);
    let tampered = webhook_body("INV-004", "Approved", "99999");

    let response = server
        .post("/webhook")
        .add_header(SIGNATURE_HEADER, signature)
        .bytes(tampered.into())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let ack: Value = response.json();
    assert_eq!(ack["success"], false);
    assert_eq!(ack["error"], "Signature verification failed");

    let entry = &state
        .stores
        .webhook_logs
        .list(&WebhookLogQuery::default())
        .await
        .unwrap()[0];
    assert_eq!(entry.outcome, WebhookOutcome::RejectedSignature);
    assert!(!entry.signature_valid);
    // An unverified payload is never retained.
    assert!(entry.stored_payload.is_none());
}

#[tokio::test]
async fn missing_signature_header_is_rejected() {
    let state = create_test_app_state();
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let response = server
        .post("/webhook")
        .bytes(webhook_body("INV-005", "Approved", "10000").into())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let ack: Value = response.json();
    assert_eq!(ack["success"], false);
    assert_eq!(ack["error"], "Missing webhook signature header");
}

#[tokio::test]
async fn sorted_field_signature_mode_is_accepted() {
    let state = create_test_app_state();
    let order = seed_order(&state, "INV-006", 10000).await;
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let body = webhook_body("INV-006", "Approved", "10000");
    // Signature over the sorted k=v string rather than the body bytes.
    let canonical = "Amount=10000&Reference=INV-006&Status=Approved";
    let signature = sign_body(canonical.as_bytes());

    let response = server
        .post("/webhook")
        .add_header(SIGNATURE_HEADER, signature)
        .bytes(body.into())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let ack: Value = response.json();
    assert_eq!(ack["success"], true);

    let updated = state
        .stores
        .orders
        .find_by_id(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn malformed_payload_reports_every_violation() {
    let state = create_test_app_state();
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let body = serde_json::to_vec(&json!({"Status": "Bogus", "Amount": "abc"})).unwrap();
    let (status, ack) = deliver(&server, &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["success"], false);
    let detail = ack["error"].as_str().unwrap();
    assert!(detail.contains("Missing required field: Reference"));
    assert!(detail.contains("Invalid status"));
    assert!(detail.contains("Invalid amount format"));

    let entry = &state
        .stores
        .webhook_logs
        .list(&WebhookLogQuery::default())
        .await
        .unwrap()[0];
    assert_eq!(entry.outcome, WebhookOutcome::RejectedPayload);
}

#[tokio::test]
async fn double_encoded_payload_is_processed() {
    let state = create_test_app_state();
    let order = seed_order(&state, "INV-007", 10000).await;
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let inner = json!({
        "Reference": "INV-007",
        "Status": "Approved",
        "Amount": "10000",
    })
    .to_string();
    let body = serde_json::to_vec(&Value::String(inner)).unwrap();

    let (status, ack) = deliver(&server, &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["success"], true);

    let updated = state
        .stores
        .orders
        .find_by_id(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn unknown_reference_is_order_not_found() {
    let state = create_test_app_state();
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let body = webhook_body("INV-MISSING", "Approved", "10000");
    let (status, ack) = deliver(&server, &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["success"], false);
    assert_eq!(ack["error"], "Order not found for reference: INV-MISSING");

    let entry = &state
        .stores
        .webhook_logs
        .list(&WebhookLogQuery::default())
        .await
        .unwrap()[0];
    assert_eq!(entry.outcome, WebhookOutcome::OrderNotFound);
}

#[tokio::test]
async fn embedded_uuid_resolves_the_order() {
    let state = create_test_app_state();
    // The order is known under a legacy reference; the gateway echoes a
    // reference wrapping the order id instead.
    let order = seed_order(&state, "legacy-reference", 10000).await;
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let reference = format!("CT-2025-{}-001", order.id);
    let body = webhook_body(&reference, "Approved", "10000");
    let (_, ack) = deliver(&server, &body).await;
    assert_eq!(ack["success"], true);

    let updated = state
        .stores
        .orders
        .find_by_id(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn amount_mismatch_blocks_crediting_until_corrected() {
    let state = create_test_app_state();
    let order = seed_order(&state, "INV-008", 10000).await;
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let wrong = webhook_body("INV-008", "Approved", "9000");
    let (status, ack) = deliver(&server, &wrong).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["success"], false);
    assert_eq!(ack["error"], "Amount mismatch: expected 10000, got 9000");

    let untouched = state
        .stores
        .orders
        .find_by_id(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.payment_status, PaymentStatus::Unpaid);

    let entry = &state
        .stores
        .webhook_logs
        .list(&WebhookLogQuery::default())
        .await
        .unwrap()[0];
    assert_eq!(entry.outcome, WebhookOutcome::AmountMismatch);

    // The corrected notification is a different event and goes through.
    let corrected = webhook_body("INV-008", "Approved", "10000");
    let (_, ack) = deliver(&server, &corrected).await;
    assert_eq!(ack["success"], true);
}

#[tokio::test]
async fn paid_order_cannot_move_backwards() {
    let state = create_test_app_state();
    let order = seed_order(&state, "INV-009", 10000).await;
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let (_, ack) = deliver(&server, &webhook_body("INV-009", "Approved", "10000")).await;
    assert_eq!(ack["success"], true);

    let (status, ack) = deliver(&server, &webhook_body("INV-009", "Declined", "10000")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["success"], false);
    assert_eq!(
        ack["error"],
        "Illegal payment state transition: paid -> failed"
    );

    let updated = state
        .stores
        .orders
        .find_by_id(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Paid);

    let entry = &state
        .stores
        .webhook_logs
        .list(&WebhookLogQuery::default())
        .await
        .unwrap()[0];
    assert_eq!(entry.outcome, WebhookOutcome::RejectedTransition);
}

#[tokio::test]
async fn refund_and_chargeback_follow_payment() {
    let state = create_test_app_state();
    let order = seed_order(&state, "INV-010", 10000).await;
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let (_, ack) = deliver(&server, &webhook_body("INV-010", "Approved", "10000")).await;
    assert_eq!(ack["success"], true);

    // Partial refund is accepted; refunds are not amount-guarded.
    let (_, ack) = deliver(&server, &webhook_body("INV-010", "Refunded", "5000")).await;
    assert_eq!(ack["success"], true);

    let refunded = state
        .stores
        .orders
        .find_by_id(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refunded.payment_status, PaymentStatus::Refunded);
    assert_eq!(refunded.order_status, OrderStatus::Cancelled);

    // Chargeback flow on a second order.
    let disputed_order = seed_order(&state, "INV-011", 7000).await;
    let (_, ack) = deliver(&server, &webhook_body("INV-011", "Approved", "7000")).await;
    assert_eq!(ack["success"], true);
    let (_, ack) = deliver(&server, &webhook_body("INV-011", "Chargeback", "7000")).await;
    assert_eq!(ack["success"], true);

    let disputed = state
        .stores
        .orders
        .find_by_id(disputed_order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(disputed.payment_status, PaymentStatus::Chargeback);
    assert_eq!(disputed.order_status, OrderStatus::Disputed);
}

#[tokio::test]
async fn pending_notification_moves_order_to_pending() {
    let state = create_test_app_state();
    let order = seed_order(&state, "INV-012", 10000).await;
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let (_, ack) = deliver(&server, &webhook_body("INV-012", "Pending", "10000")).await;
    assert_eq!(ack["success"], true);

    let updated = state
        .stores
        .orders
        .find_by_id(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Pending);
    // The broader lifecycle is untouched by a pending notification.
    assert_eq!(updated.order_status, OrderStatus::Pending);
}

#[tokio::test]
async fn declined_payment_records_failure_evidence() {
    let state = create_test_app_state();
    let order = seed_order(&state, "INV-013", 10000).await;
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let body = serde_json::to_vec(&json!({
        "Reference": "INV-013",
        "Status": "Declined",
        "Amount": "10000",
        "ResponseText": "Insufficient funds",
    }))
    .unwrap();
    let (_, ack) = deliver(&server, &body).await;
    assert_eq!(ack["success"], true);

    let updated = state
        .stores
        .orders
        .find_by_id(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Failed);
    assert_eq!(updated.payment_error.as_deref(), Some("Insufficient funds"));
}

#[tokio::test]
async fn card_numbers_never_reach_the_audit_log() {
    let state = create_test_app_state();
    seed_order(&state, "INV-014", 10000).await;
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let body = serde_json::to_vec(&json!({
        "Reference": "INV-014",
        "Status": "Approved",
        "Amount": "10000",
        "CardNumber": "4111111111111111",
    }))
    .unwrap();
    let (_, ack) = deliver(&server, &body).await;
    assert_eq!(ack["success"], true);

    let entry = &state
        .stores
        .webhook_logs
        .list(&WebhookLogQuery::default())
        .await
        .unwrap()[0];
    let stored = entry.stored_payload.as_ref().unwrap();
    assert_eq!(stored["CardNumber"], "************1111");
}
