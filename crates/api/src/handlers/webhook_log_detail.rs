use axum::extract::{Path, State};
use axum::Json;
use payhook_core::services::monitor_service::MonitorService;
use payhook_core::AppState;
use payhook_primitives::error::ApiError;
use payhook_primitives::models::entities::webhook_log::WebhookLogEntry;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/monitor/webhooks/{id}",
    tag = "Monitoring",
    summary = "Inspect one audit entry",
    params(("id" = Uuid, Path, description = "Audit entry identifier")),
    responses(
        (status = 200, description = "Full entry detail", body = WebhookLogEntry),
        (status = 401, description = "Missing or invalid operator token"),
        (status = 404, description = "No such entry"),
    ),
)]
pub async fn webhook_log_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<WebhookLogEntry>, ApiError> {
    Ok(Json(MonitorService::detail(&state, id).await?))
}
