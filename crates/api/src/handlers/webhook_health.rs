use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use payhook_core::AppState;
use payhook_primitives::models::dtos::webhook_dto::HealthStatus;
use std::sync::Arc;
use tracing::error;

#[utoipa::path(
    get,
    path = "/webhook",
    tag = "Webhook",
    summary = "Webhook endpoint health probe",
    responses(
        (status = 200, description = "Endpoint can accept deliveries", body = HealthStatus),
        (status = 503, description = "Missing gateway configuration or audit store down", body = HealthStatus),
    ),
    security(()),
)]
pub async fn webhook_health(State(state): State<Arc<AppState>>) -> Response {
    if state.config.gateway_details.webhook_secret.is_none() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthStatus::unhealthy(
                "No active payment gateway configuration",
            )),
        )
            .into_response();
    }

    match state.stores.webhook_logs.health_check().await {
        Ok(()) => Json(HealthStatus::healthy()).into_response(),
        Err(e) => {
            error!("Health check store probe failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthStatus::unhealthy("Audit store connection failed")),
            )
                .into_response()
        }
    }
}
