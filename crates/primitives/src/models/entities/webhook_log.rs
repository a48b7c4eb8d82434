use crate::models::entities::enum_types::{WebhookOutcome, WebhookType};
use crate::schema::webhook_logs;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Append-only audit record, one per delivery attempt. The raw body is never
/// retained; `stored_payload` is the parsed payload with sensitive fields
/// masked, kept so operators can reprocess the entry.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, ToSchema)]
#[diesel(table_name = webhook_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WebhookLogEntry {
    pub id: Uuid,
    pub received_at: DateTime<Utc>,
    pub source_address: String,
    pub signature_valid: bool,
    pub raw_payload_digest: String,
    #[schema(value_type = Object)]
    pub stored_payload: Option<serde_json::Value>,
    pub declared_signature: Option<String>,
    pub idempotency_key: Option<String>,
    pub payment_reference: Option<String>,
    pub webhook_type: Option<WebhookType>,
    pub order_id: Option<Uuid>,
    pub amount_minor_units: Option<i64>,
    pub outcome: WebhookOutcome,
    pub error_detail: Option<String>,
    pub retry_of: Option<Uuid>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = webhook_logs)]
pub struct NewWebhookLogEntry {
    pub id: Uuid,
    pub received_at: DateTime<Utc>,
    pub source_address: String,
    pub signature_valid: bool,
    pub raw_payload_digest: String,
    pub stored_payload: Option<serde_json::Value>,
    pub declared_signature: Option<String>,
    pub idempotency_key: Option<String>,
    pub payment_reference: Option<String>,
    pub webhook_type: Option<WebhookType>,
    pub order_id: Option<Uuid>,
    pub amount_minor_units: Option<i64>,
    pub outcome: WebhookOutcome,
    pub error_detail: Option<String>,
    pub retry_of: Option<Uuid>,
}

impl NewWebhookLogEntry {
    pub fn into_entry(self) -> WebhookLogEntry {
        WebhookLogEntry {
            id: self.id,
            received_at: self.received_at,
            source_address: self.source_address,
            signature_valid: self.signature_valid,
            raw_payload_digest: self.raw_payload_digest,
            stored_payload: self.stored_payload,
            declared_signature: self.declared_signature,
            idempotency_key: self.idempotency_key,
            payment_reference: self.payment_reference,
            webhook_type: self.webhook_type,
            order_id: self.order_id,
            amount_minor_units: self.amount_minor_units,
            outcome: self.outcome,
            error_detail: self.error_detail,
            retry_of: self.retry_of,
        }
    }
}
