#![allow(dead_code)]

use axum::Router;
use hmac::{Hmac, Mac};
use payhook_core::app_state::{AppState, Stores};
use payhook_primitives::models::config::allowlist_details::AllowlistInfo;
use payhook_primitives::models::config::gateway_details::GatewayInfo;
use payhook_primitives::models::config::limit_details::LimitInfo;
use payhook_primitives::models::config::operator_details::OperatorInfo;
use payhook_primitives::models::config::{AppConfig, AppEnv};
use payhook_primitives::models::entities::order::{NewOrder, Order};
use secrecy::SecretString;
use serde_json::{json, Value};
use sha2::Sha256;
use std::sync::Arc;

pub const WEBHOOK_SECRET: &str = "test_gateway_webhook_secret";
pub const SIGNATURE_HEADER: &str = "x-gateway-signature";

/// Configuration mirroring a deployed instance, pointed at nothing.
pub fn test_config(environment: AppEnv) -> AppConfig {
    AppConfig {
        environment,
        gateway_details: GatewayInfo {
            webhook_secret: Some(SecretString::new(WEBHOOK_SECRET.into())),
            signature_header: SIGNATURE_HEADER.to_string(),
        },
        allowlist_details: AllowlistInfo::defaults().expect("default allowlist ranges parse"),
        limit_details: LimitInfo::default(),
        operator_details: OperatorInfo {
            jwt_secret: SecretString::new("test_secret_key_minimum_32_characters_long".into()),
            jwt_expiration_hours: 2,
            jwt_issuer: "payhook".to_string(),
            jwt_audience: "payhook_ops".to_string(),
        },
    }
}

pub fn create_test_app_state() -> Arc<AppState> {
    AppState::new(Stores::in_memory(), test_config(AppEnv::Test))
}

#[allow(dead_code)]
pub fn create_test_app_state_with(config: AppConfig) -> Arc<AppState> {
    AppState::new(Stores::in_memory(), config)
}

pub fn create_test_app(state: Arc<AppState>) -> Router {
    payhook_api::app::create_router(state)
}

/// Signature the gateway would send for `body`.
pub fn sign_body(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

pub fn webhook_body(reference: &str, status: &str, amount: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "Reference": reference,
        "Status": status,
        "Amount": amount,
    }))
    .unwrap()
}

#[allow(dead_code)]
pub fn webhook_body_with_tx(reference: &str, status: &str, amount: &str, tx: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "Reference": reference,
        "Status": status,
        "Amount": amount,
        "TransactionID": tx,
    }))
    .unwrap()
}

pub async fn seed_order(
    state: &Arc<AppState>,
    reference: &str,
    total_amount_minor_units: i64,
) -> Order {
    state
        .stores
        .orders
        .insert(NewOrder::unpaid(reference, total_amount_minor_units))
        .await
        .expect("seed order")
}

#[allow(dead_code)]
pub async fn deliver(
    server: &axum_test::TestServer,
    body: &[u8],
) -> (http::StatusCode, Value) {
    let response = server
        .post("/webhook")
        .add_header(SIGNATURE_HEADER, sign_body(body))
        .bytes(body.to_vec().into())
        .await;
    let status = response.status_code();
    (status, response.json())
}

#[allow(dead_code)]
pub fn operator_token(state: &Arc<AppState>) -> String {
    payhook_core::security::SecurityConfig::create_token(&state.config, "ops-tester")
        .expect("mint operator token")
}
