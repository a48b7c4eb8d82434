//! Per-source request throttling over an atomic `increment_and_check` store
//! operation, so correctness holds across concurrent requests and multiple
//! process instances. A store failure fails open: dropping a legitimate
//! gateway delivery costs more than letting one extra request through.

use crate::stores::RateLimitStore;
use payhook_primitives::models::config::limit_details::LimitInfo;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub retry_after_secs: u64,
}

impl RateDecision {
    pub fn open(limit: u32) -> Self {
        Self {
            allowed: true,
            limit,
            remaining: limit,
            retry_after_secs: 0,
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    max_requests: u32,
    window_secs: u64,
    override_key: Option<String>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, limits: &LimitInfo) -> Self {
        Self {
            store,
            max_requests: limits.rate_limit_max_requests,
            window_secs: limits.rate_limit_window_secs,
            override_key: limits.rate_limit_override_key.clone(),
        }
    }

    /// The bucket a caller counts against: its source address, unless a
    /// shared override key is configured.
    pub fn source_key(&self, address: &str) -> String {
        self.override_key
            .clone()
            .unwrap_or_else(|| address.to_string())
    }

    pub async fn allow(&self, address: &str) -> RateDecision {
        let key = self.source_key(address);
        match self
            .store
            .increment_and_check(&key, self.max_requests, self.window_secs)
            .await
        {
            Ok(decision) => decision,
            Err(e) => {
                warn!("Rate limit store unavailable, failing open: {}", e);
                RateDecision::open(self.max_requests)
            }
        }
    }
}
