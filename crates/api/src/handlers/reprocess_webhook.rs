use crate::handlers::gateway_webhook::ack_response;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Extension;
use payhook_core::security::Claims;
use payhook_core::services::monitor_service::MonitorService;
use payhook_core::AppState;
use payhook_primitives::error::ApiError;
use payhook_primitives::models::dtos::webhook_dto::WebhookAck;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/monitor/webhooks/{id}/reprocess",
    tag = "Monitoring",
    summary = "Reprocess a previously failed delivery",
    description = "Replays the stored payload through the pipeline starting at signature \
                   verification. The replay is subject to the same idempotency and \
                   state-machine guards as a fresh delivery.",
    params(("id" = Uuid, Path, description = "Audit entry identifier")),
    responses(
        (status = 200, description = "Replay classified", body = WebhookAck),
        (status = 401, description = "Missing or invalid operator token"),
        (status = 404, description = "No such entry"),
        (status = 400, description = "Entry has no stored payload to reprocess"),
    ),
)]
pub async fn reprocess_webhook(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let report = MonitorService::reprocess(&state, id, &claims.sub).await?;
    Ok(ack_response(report))
}
