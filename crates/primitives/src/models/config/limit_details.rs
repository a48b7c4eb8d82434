use eyre::{eyre, Report};
use std::env;

/// Rate-limit, dedup-retention, and amount-tolerance policy knobs.
#[derive(Debug, Clone)]
pub struct LimitInfo {
    /// Requests allowed per source key per window.
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_secs: u64,
    /// When set, all callers share this single bucket instead of one per
    /// source address (useful when every delivery arrives through one NAT).
    pub rate_limit_override_key: Option<String>,
    /// Idempotency records older than this are pruned.
    pub dedup_retention_hours: i64,
    /// Permitted disagreement between a notification amount and the order
    /// total before the transition is rejected.
    pub amount_tolerance_minor_units: i64,
}

impl LimitInfo {
    pub fn new() -> Result<Self, Report> {
        Ok(Self {
            rate_limit_max_requests: parse_env("RATE_LIMIT_MAX_REQUESTS", 100)?,
            rate_limit_window_secs: parse_env("RATE_LIMIT_WINDOW_SECS", 60)?,
            rate_limit_override_key: env::var("RATE_LIMIT_OVERRIDE_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            dedup_retention_hours: parse_env("DEDUP_RETENTION_HOURS", 168)?,
            amount_tolerance_minor_units: parse_env("AMOUNT_TOLERANCE_MINOR_UNITS", 0)?,
        })
    }
}

impl Default for LimitInfo {
    fn default() -> Self {
        Self {
            rate_limit_max_requests: 100,
            rate_limit_window_secs: 60,
            rate_limit_override_key: None,
            dedup_retention_hours: 168,
            amount_tolerance_minor_units: 0,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, Report>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|e| eyre!("Invalid {name}: {e}")),
        Err(_) => Ok(default),
    }
}
