use axum::extract::{Query, State};
use axum::Json;
use payhook_core::services::monitor_service::MonitorService;
use payhook_core::AppState;
use payhook_primitives::error::ApiError;
use payhook_primitives::models::dtos::monitor_dto::{WebhookLogPage, WebhookLogQuery};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/monitor/webhooks",
    tag = "Monitoring",
    summary = "List audit entries",
    params(WebhookLogQuery),
    responses(
        (status = 200, description = "Filtered page of audit entries, newest first", body = WebhookLogPage),
        (status = 401, description = "Missing or invalid operator token"),
    ),
)]
pub async fn list_webhook_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WebhookLogQuery>,
) -> Result<Json<WebhookLogPage>, ApiError> {
    Ok(Json(MonitorService::list(&state, &query).await?))
}
