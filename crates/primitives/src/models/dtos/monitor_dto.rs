use crate::models::entities::enum_types::WebhookOutcome;
use crate::models::entities::webhook_log::WebhookLogEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct WebhookLogQuery {
    pub outcome: Option<WebhookOutcome>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookLogPage {
    pub entries: Vec<WebhookLogEntry>,
    pub page: i64,
    pub size: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OutcomeCount {
    pub outcome: WebhookOutcome,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookStats {
    pub since: DateTime<Utc>,
    pub counts: Vec<OutcomeCount>,
}
