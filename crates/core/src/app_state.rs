use crate::allowlist::SourceAllowlist;
use crate::ratelimit::RateLimiter;
use crate::stores::memory::{
    MemoryDedupStore, MemoryOrderStore, MemoryRateLimitStore, MemoryWebhookLogStore,
};
use crate::stores::postgres::{
    DbPool, PgDedupStore, PgOrderStore, PgRateLimitStore, PgWebhookLogStore,
};
use crate::stores::{DedupStore, OrderStore, RateLimitStore, WebhookLogStore};
use std::sync::Arc;

pub use payhook_primitives::models::config::AppConfig;

#[derive(Clone)]
pub struct Stores {
    pub orders: Arc<dyn OrderStore>,
    pub dedup: Arc<dyn DedupStore>,
    pub webhook_logs: Arc<dyn WebhookLogStore>,
    pub rate_limits: Arc<dyn RateLimitStore>,
}

impl Stores {
    pub fn postgres(pool: DbPool) -> Self {
        Self {
            orders: Arc::new(PgOrderStore::new(pool.clone())),
            dedup: Arc::new(PgDedupStore::new(pool.clone())),
            webhook_logs: Arc::new(PgWebhookLogStore::new(pool.clone())),
            rate_limits: Arc::new(PgRateLimitStore::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            orders: Arc::new(MemoryOrderStore::default()),
            dedup: Arc::new(MemoryDedupStore::default()),
            webhook_logs: Arc::new(MemoryWebhookLogStore::default()),
            rate_limits: Arc::new(MemoryRateLimitStore::default()),
        }
    }
}

pub struct AppState {
    pub stores: Stores,
    pub config: AppConfig,
    pub rate_limiter: RateLimiter,
    pub allowlist: SourceAllowlist,
}

impl AppState {
    pub fn new(stores: Stores, config: AppConfig) -> Arc<Self> {
        let rate_limiter = RateLimiter::new(stores.rate_limits.clone(), &config.limit_details);
        let allowlist = SourceAllowlist::new(
            config.allowlist_details.allowed_ranges.clone(),
            !config.environment.is_production(),
        );

        Arc::new(Self {
            stores,
            config,
            rate_limiter,
            allowlist,
        })
    }
}
