//! Diesel-backed stores. The dedup reserve and the rate increment are
//! single-statement upserts, and the order transition runs under a row lock,
//! so the atomicity lives in Postgres rather than in application code.

use super::{DedupStore, OrderStore, RateLimitStore, Reservation, WebhookLogStore};
use crate::ratelimit::RateDecision;
use crate::state_machine::TransitionPlan;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::PgConnection;
use payhook_primitives::error::ApiError;
use payhook_primitives::models::dtos::monitor_dto::WebhookLogQuery;
use payhook_primitives::models::entities::enum_types::WebhookOutcome;
use payhook_primitives::models::entities::idempotency::{IdempotencyRecord, NewIdempotencyRecord};
use payhook_primitives::models::entities::order::{NewOrder, Order};
use payhook_primitives::models::entities::rate_counter::{NewRateCounter, RateCounter};
use payhook_primitives::models::entities::webhook_log::{NewWebhookLogEntry, WebhookLogEntry};
use payhook_primitives::schema::{idempotency_keys, orders, rate_counters, webhook_logs};
use uuid::Uuid;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

fn conn(pool: &DbPool) -> Result<PooledConnection<ConnectionManager<PgConnection>>, ApiError> {
    pool.get()
        .map_err(|e| ApiError::DatabaseConnection(e.to_string()))
}

pub struct PgOrderStore {
    pool: DbPool,
}

impl PgOrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<Order, ApiError> {
        let mut conn = conn(&self.pool)?;
        diesel::insert_into(orders::table)
            .values(&order)
            .get_result::<Order>(&mut conn)
            .map_err(ApiError::Database)
    }

    async fn find_by_payment_reference(&self, reference: &str) -> Result<Option<Order>, ApiError> {
        let mut conn = conn(&self.pool)?;
        orders::table
            .filter(orders::payment_reference.eq(reference))
            .first::<Order>(&mut conn)
            .optional()
            .map_err(ApiError::Database)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, ApiError> {
        let mut conn = conn(&self.pool)?;
        orders::table
            .find(id)
            .first::<Order>(&mut conn)
            .optional()
            .map_err(ApiError::Database)
    }

    async fn apply_transition(
        &self,
        order_id: Uuid,
        plan: &TransitionPlan,
    ) -> Result<bool, ApiError> {
        let mut conn = conn(&self.pool)?;

        conn.transaction::<bool, diesel::result::Error, _>(|conn| {
            // Row lock scoped to this single order; contention is only ever
            // between deliveries for the same payment reference.
            let current: Option<Order> = orders::table
                .find(order_id)
                .for_update()
                .first(conn)
                .optional()?;

            let Some(current) = current else {
                return Ok(false);
            };
            if current.payment_status != plan.from {
                return Ok(false);
            }
            let Some(to) = plan.to else {
                return Ok(true);
            };

            diesel::update(orders::table.find(order_id))
                .set((
                    orders::payment_status.eq(to),
                    orders::order_status.eq(plan.order_status.unwrap_or(current.order_status)),
                    orders::gateway_transaction_id.eq(plan
                        .gateway_transaction_id
                        .clone()
                        .or(current.gateway_transaction_id)),
                    orders::paid_at.eq(plan.paid_at.or(current.paid_at)),
                    orders::payment_error.eq(plan.payment_error.clone()),
                    orders::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            Ok(true)
        })
        .map_err(ApiError::Database)
    }
}

pub struct PgDedupStore {
    pool: DbPool,
}

impl PgDedupStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DedupStore for PgDedupStore {
    async fn check_and_reserve(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Reservation, ApiError> {
        let mut conn = conn(&self.pool)?;

        let inserted = diesel::insert_into(idempotency_keys::table)
            .values(&NewIdempotencyRecord {
                key: key.to_string(),
                first_seen_at: now,
                outcome: None,
            })
            .on_conflict(idempotency_keys::key)
            .do_nothing()
            .execute(&mut conn)
            .map_err(ApiError::Database)?;

        if inserted == 1 {
            return Ok(Reservation {
                is_new: true,
                existing_outcome: None,
            });
        }

        let existing = idempotency_keys::table
            .find(key)
            .first::<IdempotencyRecord>(&mut conn)
            .optional()
            .map_err(ApiError::Database)?;

        Ok(Reservation {
            is_new: false,
            existing_outcome: existing.and_then(|record| record.outcome),
        })
    }

    async fn finalize(&self, key: &str, outcome: WebhookOutcome) -> Result<(), ApiError> {
        let mut conn = conn(&self.pool)?;
        diesel::update(
            idempotency_keys::table
                .find(key)
                .filter(idempotency_keys::outcome.is_null()),
        )
        .set(idempotency_keys::outcome.eq(Some(outcome)))
        .execute(&mut conn)
        .map_err(ApiError::Database)?;
        Ok(())
    }

    async fn release(&self, key: &str) -> Result<(), ApiError> {
        let mut conn = conn(&self.pool)?;
        diesel::delete(idempotency_keys::table.find(key))
            .execute(&mut conn)
            .map_err(ApiError::Database)?;
        Ok(())
    }

    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, ApiError> {
        let mut conn = conn(&self.pool)?;
        diesel::delete(idempotency_keys::table.filter(idempotency_keys::first_seen_at.lt(cutoff)))
            .execute(&mut conn)
            .map_err(ApiError::Database)
    }
}

pub struct PgWebhookLogStore {
    pool: DbPool,
}

impl PgWebhookLogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookLogStore for PgWebhookLogStore {
    async fn append(&self, entry: NewWebhookLogEntry) -> Result<(), ApiError> {
        let mut conn = conn(&self.pool)?;
        diesel::insert_into(webhook_logs::table)
            .values(&entry)
            .execute(&mut conn)
            .map_err(ApiError::Database)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<WebhookLogEntry>, ApiError> {
        let mut conn = conn(&self.pool)?;
        webhook_logs::table
            .find(id)
            .first::<WebhookLogEntry>(&mut conn)
            .optional()
            .map_err(ApiError::Database)
    }

    async fn list(&self, query: &WebhookLogQuery) -> Result<Vec<WebhookLogEntry>, ApiError> {
        let mut conn = conn(&self.pool)?;
        let (page, size) = super::page_bounds(query);

        let mut statement = webhook_logs::table.into_boxed();
        if let Some(outcome) = query.outcome {
            statement = statement.filter(webhook_logs::outcome.eq(outcome));
        }
        if let Some(from) = query.from {
            statement = statement.filter(webhook_logs::received_at.ge(from));
        }
        if let Some(to) = query.to {
            statement = statement.filter(webhook_logs::received_at.le(to));
        }

        statement
            .order(webhook_logs::received_at.desc())
            .limit(size)
            .offset((page - 1) * size)
            .load::<WebhookLogEntry>(&mut conn)
            .map_err(ApiError::Database)
    }

    async fn count_outcomes_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<(WebhookOutcome, i64)>, ApiError> {
        let mut conn = conn(&self.pool)?;
        webhook_logs::table
            .filter(webhook_logs::received_at.ge(since))
            .group_by(webhook_logs::outcome)
            .select((webhook_logs::outcome, diesel::dsl::count_star()))
            .order(webhook_logs::outcome.asc())
            .load::<(WebhookOutcome, i64)>(&mut conn)
            .map_err(ApiError::Database)
    }

    async fn health_check(&self) -> Result<(), ApiError> {
        let mut conn = conn(&self.pool)?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .map_err(ApiError::Database)?;
        Ok(())
    }
}

pub struct PgRateLimitStore {
    pool: DbPool,
}

impl PgRateLimitStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimitStore for PgRateLimitStore {
    async fn increment_and_check(
        &self,
        key: &str,
        limit: u32,
        window_secs: u64,
    ) -> Result<RateDecision, ApiError> {
        let mut conn = conn(&self.pool)?;
        let now = Utc::now();
        let window = Duration::seconds(window_secs as i64);

        let (window_start, count) = conn
            .transaction::<(DateTime<Utc>, i32), diesel::result::Error, _>(|conn| {
                // Database-level increment; never read-then-write.
                let row: RateCounter = diesel::insert_into(rate_counters::table)
                    .values(&NewRateCounter {
                        source_key: key.to_string(),
                        window_start: now,
                        count: 1,
                    })
                    .on_conflict(rate_counters::source_key)
                    .do_update()
                    .set(rate_counters::count.eq(rate_counters::count + 1))
                    .get_result(conn)?;

                if now - row.window_start >= window {
                    diesel::update(rate_counters::table.find(key))
                        .set((
                            rate_counters::window_start.eq(now),
                            rate_counters::count.eq(1),
                        ))
                        .execute(conn)?;
                    return Ok((now, 1));
                }

                Ok((row.window_start, row.count))
            })
            .map_err(ApiError::Database)?;

        let allowed = count <= limit as i32;
        Ok(RateDecision {
            allowed,
            limit,
            remaining: (limit as i64 - count as i64).max(0) as u32,
            retry_after_secs: if allowed {
                0
            } else {
                ((window_start + window) - now).num_seconds().max(1) as u64
            },
        })
    }
}
