use axum::extract::{Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use payhook_core::services::monitor_service::MonitorService;
use payhook_core::AppState;
use payhook_primitives::error::ApiError;
use payhook_primitives::models::dtos::monitor_dto::WebhookStats;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct StatsQuery {
    /// Look-back window in hours, default 24.
    pub hours: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/monitor/webhooks/stats",
    tag = "Monitoring",
    summary = "Outcome counts over a window",
    params(StatsQuery),
    responses(
        (status = 200, description = "Per-outcome delivery counts", body = WebhookStats),
        (status = 401, description = "Missing or invalid operator token"),
    ),
)]
pub async fn webhook_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<WebhookStats>, ApiError> {
    let hours = query.hours.unwrap_or(24).clamp(1, 24 * 90);
    let since = Utc::now() - Duration::hours(hours);
    Ok(Json(MonitorService::stats(&state, since).await?))
}
