use crate::models::entities::enum_types::WebhookOutcome;
use crate::schema::idempotency_keys;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

/// One row per logical event fingerprint. `outcome` stays `None` while the
/// first processing of the key is in flight and is written exactly once when
/// that processing concludes effectfully.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = idempotency_keys)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IdempotencyRecord {
    pub key: String,
    pub first_seen_at: DateTime<Utc>,
    pub outcome: Option<WebhookOutcome>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = idempotency_keys)]
pub struct NewIdempotencyRecord {
    pub key: String,
    pub first_seen_at: DateTime<Utc>,
    pub outcome: Option<WebhookOutcome>,
}
