use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use http::header::RETRY_AFTER;
use http::{HeaderMap, StatusCode};
use payhook_core::services::webhook_service::{
    DeliveryReport, InboundNotification, WebhookService,
};
use payhook_core::AppState;
use payhook_primitives::models::dtos::webhook_dto::WebhookAck;
use payhook_primitives::models::entities::enum_types::WebhookOutcome;
use std::sync::Arc;
use tracing::error;

/// Deliveries arrive through a proxy, so the source address comes from the
/// forwarding headers; the first hop of x-forwarded-for wins.
pub(crate) fn client_ip(headers: &HeaderMap) -> String {
    for header in ["x-forwarded-for", "cf-connecting-ip", "x-real-ip"] {
        if let Some(value) = headers.get(header).and_then(|v| v.to_str().ok()) {
            if let Some(first) = value.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }
    "unknown".to_string()
}

fn declared_signature(headers: &HeaderMap, configured_header: &str) -> Option<String> {
    headers
        .get(configured_header)
        .or_else(|| headers.get("x-signature"))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[utoipa::path(
    post,
    path = "/webhook",
    tag = "Webhook",
    summary = "Payment gateway notification endpoint",
    description = "Receives payment-status notifications from the gateway. Business rejections \
                   (bad signature, duplicate, unknown order) are acknowledged with HTTP 200 and \
                   `success: false` so the gateway does not redeliver an outcome that cannot \
                   change; only an internal failure returns 5xx.",
    request_body(content = String, description = "Raw gateway payload", content_type = "application/json"),
    responses(
        (status = 200, description = "Delivery classified", body = WebhookAck),
        (status = 429, description = "Source is over its rate limit", body = WebhookAck),
        (status = 500, description = "Internal error, redelivery useful", body = WebhookAck),
    ),
    security(()),
)]
pub async fn gateway_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let delivery = InboundNotification {
        raw_body: body.to_vec(),
        declared_signature: declared_signature(
            &headers,
            &state.config.gateway_details.signature_header,
        ),
        source_address: client_ip(&headers),
        received_at: Utc::now(),
        retry_of: None,
    };

    match WebhookService::process_delivery(&state, delivery).await {
        Ok(report) => ack_response(report),
        Err(e) => {
            error!("Webhook delivery failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookAck {
                    success: false,
                    message: None,
                    error: Some("Internal server error".to_string()),
                    webhook_id: None,
                    retry_after: None,
                }),
            )
                .into_response()
        }
    }
}

pub(crate) fn ack_response(report: DeliveryReport) -> Response {
    let ack = WebhookAck {
        success: report.success(),
        message: report.message.clone(),
        error: report.error.clone(),
        webhook_id: report.webhook_id,
        retry_after: report.retry_after_secs,
    };

    match report.outcome {
        WebhookOutcome::RateLimited => {
            let retry_after = report.retry_after_secs.unwrap_or(1).to_string();
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(RETRY_AFTER, retry_after)],
                Json(ack),
            )
                .into_response()
        }
        _ => Json(ack).into_response(),
    }
}
