use crate::models::entities::enum_types::ExternalStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Validated projection of one gateway notification. Only the validator
/// constructs this.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ParsedPaymentEvent {
    pub reference: String,
    pub transaction_id: Option<String>,
    pub external_status: ExternalStatus,
    pub amount_minor_units: i64,
    pub occurred_at: DateTime<Utc>,
    /// Gateway-supplied human-readable detail, kept as failure evidence.
    pub response_text: Option<String>,
}

/// Body returned to the gateway for every delivery. Business rejections are
/// acknowledged with `success: false` so the gateway does not retry-storm a
/// rejection that redelivery cannot fix.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".into(),
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: "unhealthy".into(),
            error: Some(error.into()),
        }
    }
}
