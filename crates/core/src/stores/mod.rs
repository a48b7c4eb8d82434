//! Storage seams for the pipeline's shared state.
//!
//! The rate counter and the dedup reservation are the two pieces of shared
//! mutable state; both traits expose atomic check-and-set operations so the
//! backing store, not application code, is the serialization point. Orders
//! are owned by the order subsystem and reached only through `OrderStore`.

pub mod memory;
pub mod postgres;

use crate::ratelimit::RateDecision;
use crate::state_machine::TransitionPlan;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use payhook_primitives::error::ApiError;
use payhook_primitives::models::dtos::monitor_dto::WebhookLogQuery;
use payhook_primitives::models::entities::enum_types::WebhookOutcome;
use payhook_primitives::models::entities::order::{NewOrder, Order};
use payhook_primitives::models::entities::webhook_log::{NewWebhookLogEntry, WebhookLogEntry};
use uuid::Uuid;

/// Result of an atomic reserve on the dedup store. Exactly one concurrent
/// caller per key observes `is_new`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub is_new: bool,
    pub existing_outcome: Option<WebhookOutcome>,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: NewOrder) -> Result<Order, ApiError>;

    async fn find_by_payment_reference(&self, reference: &str) -> Result<Option<Order>, ApiError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, ApiError>;

    /// Applies the plan as a conditional update keyed on the order still
    /// being in `plan.from`. Returns `false` when a concurrent transition
    /// won the race; nothing is written in that case.
    async fn apply_transition(&self, order_id: Uuid, plan: &TransitionPlan)
        -> Result<bool, ApiError>;
}

#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Insert-if-absent. The first caller for a key gets `is_new = true` and
    /// may proceed to mutate state; everyone else gets the recorded outcome
    /// (or `None` while the first processing is still in flight).
    async fn check_and_reserve(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Reservation, ApiError>;

    /// Record the outcome of the first processing. Written at most once.
    async fn finalize(&self, key: &str, outcome: WebhookOutcome) -> Result<(), ApiError>;

    /// Drop a reservation whose processing did not conclude effectfully, so
    /// a corrected redelivery or an operator reprocess can run.
    async fn release(&self, key: &str) -> Result<(), ApiError>;

    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, ApiError>;
}

#[async_trait]
pub trait WebhookLogStore: Send + Sync {
    async fn append(&self, entry: NewWebhookLogEntry) -> Result<(), ApiError>;

    async fn get(&self, id: Uuid) -> Result<Option<WebhookLogEntry>, ApiError>;

    /// Newest first, filtered by outcome and time range, paginated.
    async fn list(&self, query: &WebhookLogQuery) -> Result<Vec<WebhookLogEntry>, ApiError>;

    async fn count_outcomes_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<(WebhookOutcome, i64)>, ApiError>;

    async fn health_check(&self) -> Result<(), ApiError>;
}

#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Atomically count this request against `key`'s current window and
    /// report whether it fits under `limit`.
    async fn increment_and_check(
        &self,
        key: &str,
        limit: u32,
        window_secs: u64,
    ) -> Result<RateDecision, ApiError>;
}

/// Normalized pagination for log listings.
pub(crate) fn page_bounds(query: &WebhookLogQuery) -> (i64, i64) {
    let size = query.size.unwrap_or(20).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    (page, size)
}
