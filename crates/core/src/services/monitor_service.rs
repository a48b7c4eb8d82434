//! Operator-facing view over the audit log: list, inspect, aggregate, and
//! reprocess. Reprocessing rebuilds a delivery from the stored payload and
//! stored signature and re-enters the pipeline at signature verification,
//! so it faces the same idempotency and state-machine guards as a fresh
//! delivery.

use crate::app_state::AppState;
use crate::services::webhook_service::{DeliveryReport, InboundNotification, WebhookService};
use chrono::{DateTime, Utc};
use payhook_primitives::error::ApiError;
use payhook_primitives::models::dtos::monitor_dto::{
    OutcomeCount, WebhookLogPage, WebhookLogQuery, WebhookStats,
};
use payhook_primitives::models::entities::webhook_log::WebhookLogEntry;
use tracing::info;
use uuid::Uuid;

pub struct MonitorService;

impl MonitorService {
    pub async fn list(
        state: &AppState,
        query: &WebhookLogQuery,
    ) -> Result<WebhookLogPage, ApiError> {
        let entries = state.stores.webhook_logs.list(query).await?;
        Ok(WebhookLogPage {
            entries,
            page: query.page.unwrap_or(1).max(1),
            size: query.size.unwrap_or(20).clamp(1, 100),
        })
    }

    pub async fn detail(state: &AppState, id: Uuid) -> Result<WebhookLogEntry, ApiError> {
        state
            .stores
            .webhook_logs
            .get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("webhook log entry {id}")))
    }

    pub async fn stats(
        state: &AppState,
        since: DateTime<Utc>,
    ) -> Result<WebhookStats, ApiError> {
        let counts = state
            .stores
            .webhook_logs
            .count_outcomes_since(since)
            .await?
            .into_iter()
            .map(|(outcome, count)| OutcomeCount { outcome, count })
            .collect();

        Ok(WebhookStats { since, counts })
    }

    pub async fn reprocess(
        state: &AppState,
        id: Uuid,
        operator: &str,
    ) -> Result<DeliveryReport, ApiError> {
        let entry = Self::detail(state, id).await?;

        let Some(stored_payload) = entry.stored_payload else {
            // Transport-level rejects never stored a payload; there is
            // nothing to replay.
            return Err(ApiError::PayloadMalformed(vec![
                "Entry has no stored payload to reprocess".to_string(),
            ]));
        };

        let raw_body = serde_json::to_vec(&stored_payload)
            .map_err(|e| ApiError::Internal(format!("Stored payload unserializable: {e}")))?;

        info!("Operator {} reprocessing webhook entry {}", operator, id);

        let delivery = InboundNotification {
            raw_body,
            declared_signature: entry.declared_signature,
            source_address: entry.source_address,
            received_at: Utc::now(),
            retry_of: Some(entry.id),
        };

        WebhookService::process_from_signature(state, delivery).await
    }
}
