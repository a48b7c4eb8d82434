//! Mutex-guarded in-memory stores. Single-process semantics only; the
//! binary uses these for local development without a database, and the test
//! suite builds on them.

use super::{DedupStore, OrderStore, RateLimitStore, Reservation, WebhookLogStore};
use crate::ratelimit::RateDecision;
use crate::state_machine::TransitionPlan;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use payhook_primitives::error::ApiError;
use payhook_primitives::models::dtos::monitor_dto::WebhookLogQuery;
use payhook_primitives::models::entities::enum_types::WebhookOutcome;
use payhook_primitives::models::entities::idempotency::IdempotencyRecord;
use payhook_primitives::models::entities::order::{NewOrder, Order};
use payhook_primitives::models::entities::webhook_log::{NewWebhookLogEntry, WebhookLogEntry};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, ApiError> {
    mutex
        .lock()
        .map_err(|_| ApiError::Internal("store lock poisoned".into()))
}

#[derive(Default)]
pub struct MemoryOrderStore {
    orders: Mutex<HashMap<Uuid, Order>>,
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<Order, ApiError> {
        let now = Utc::now();
        let order = Order {
            id: order.id,
            payment_reference: order.payment_reference,
            payment_status: order.payment_status,
            order_status: order.order_status,
            total_amount_minor_units: order.total_amount_minor_units,
            gateway_transaction_id: None,
            paid_at: None,
            payment_error: None,
            created_at: now,
            updated_at: now,
        };
        lock(&self.orders)?.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_by_payment_reference(&self, reference: &str) -> Result<Option<Order>, ApiError> {
        Ok(lock(&self.orders)?
            .values()
            .find(|order| order.payment_reference == reference)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, ApiError> {
        Ok(lock(&self.orders)?.get(&id).cloned())
    }

    async fn apply_transition(
        &self,
        order_id: Uuid,
        plan: &TransitionPlan,
    ) -> Result<bool, ApiError> {
        let mut orders = lock(&self.orders)?;
        let Some(order) = orders.get_mut(&order_id) else {
            return Ok(false);
        };
        if order.payment_status != plan.from {
            return Ok(false);
        }
        let Some(to) = plan.to else {
            return Ok(true);
        };

        order.payment_status = to;
        if let Some(order_status) = plan.order_status {
            order.order_status = order_status;
        }
        if plan.gateway_transaction_id.is_some() {
            order.gateway_transaction_id = plan.gateway_transaction_id.clone();
        }
        if plan.paid_at.is_some() {
            order.paid_at = plan.paid_at;
        }
        order.payment_error = plan.payment_error.clone();
        order.updated_at = Utc::now();
        Ok(true)
    }
}

#[derive(Default)]
pub struct MemoryDedupStore {
    records: Mutex<HashMap<String, IdempotencyRecord>>,
}

#[async_trait]
impl DedupStore for MemoryDedupStore {
    async fn check_and_reserve(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Reservation, ApiError> {
        let mut records = lock(&self.records)?;
        match records.get(key) {
            Some(existing) => Ok(Reservation {
                is_new: false,
                existing_outcome: existing.outcome,
            }),
            None => {
                records.insert(
                    key.to_string(),
                    IdempotencyRecord {
                        key: key.to_string(),
                        first_seen_at: now,
                        outcome: None,
                    },
                );
                Ok(Reservation {
                    is_new: true,
                    existing_outcome: None,
                })
            }
        }
    }

    async fn finalize(&self, key: &str, outcome: WebhookOutcome) -> Result<(), ApiError> {
        if let Some(record) = lock(&self.records)?.get_mut(key) {
            if record.outcome.is_none() {
                record.outcome = Some(outcome);
            }
        }
        Ok(())
    }

    async fn release(&self, key: &str) -> Result<(), ApiError> {
        lock(&self.records)?.remove(key);
        Ok(())
    }

    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, ApiError> {
        let mut records = lock(&self.records)?;
        let before = records.len();
        records.retain(|_, record| record.first_seen_at >= cutoff);
        Ok(before - records.len())
    }
}

#[derive(Default)]
pub struct MemoryWebhookLogStore {
    entries: Mutex<Vec<WebhookLogEntry>>,
}

#[async_trait]
impl WebhookLogStore for MemoryWebhookLogStore {
    async fn append(&self, entry: NewWebhookLogEntry) -> Result<(), ApiError> {
        lock(&self.entries)?.push(entry.into_entry());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<WebhookLogEntry>, ApiError> {
        Ok(lock(&self.entries)?
            .iter()
            .find(|entry| entry.id == id)
            .cloned())
    }

    async fn list(&self, query: &WebhookLogQuery) -> Result<Vec<WebhookLogEntry>, ApiError> {
        let (page, size) = super::page_bounds(query);

        let mut matched: Vec<WebhookLogEntry> = lock(&self.entries)?
            .iter()
            .filter(|entry| query.outcome.map_or(true, |o| entry.outcome == o))
            .filter(|entry| query.from.map_or(true, |from| entry.received_at >= from))
            .filter(|entry| query.to.map_or(true, |to| entry.received_at <= to))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.received_at.cmp(&a.received_at));

        Ok(matched
            .into_iter()
            .skip(((page - 1) * size) as usize)
            .take(size as usize)
            .collect())
    }

    async fn count_outcomes_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<(WebhookOutcome, i64)>, ApiError> {
        let mut counts: HashMap<WebhookOutcome, i64> = HashMap::new();
        for entry in lock(&self.entries)?.iter() {
            if entry.received_at >= since {
                *counts.entry(entry.outcome).or_default() += 1;
            }
        }

        let mut counts: Vec<(WebhookOutcome, i64)> = counts.into_iter().collect();
        counts.sort_by_key(|(outcome, _)| outcome.to_string());
        Ok(counts)
    }

    async fn health_check(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRateLimitStore {
    windows: Mutex<HashMap<String, (DateTime<Utc>, u32)>>,
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn increment_and_check(
        &self,
        key: &str,
        limit: u32,
        window_secs: u64,
    ) -> Result<RateDecision, ApiError> {
        let now = Utc::now();
        let window = Duration::seconds(window_secs as i64);

        let mut windows = lock(&self.windows)?;
        let slot = windows.entry(key.to_string()).or_insert((now, 0));
        if now - slot.0 >= window {
            *slot = (now, 0);
        }
        slot.1 += 1;

        let allowed = slot.1 <= limit;
        Ok(RateDecision {
            allowed,
            limit,
            remaining: limit.saturating_sub(slot.1),
            retry_after_secs: if allowed {
                0
            } else {
                ((slot.0 + window) - now).num_seconds().max(1) as u64
            },
        })
    }
}
