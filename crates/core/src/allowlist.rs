//! Source address filtering.
//!
//! The gateway publishes its egress ranges, so anything else is dropped
//! before signature work happens. Loopback stays open for local testing, and
//! non-production environments run permissive. The table is config-driven;
//! no lookups, no I/O.

use ipnetwork::IpNetwork;
use payhook_primitives::models::config::AppConfig;
use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct SourceAllowlist {
    ranges: Vec<IpNetwork>,
    permissive: bool,
}

impl SourceAllowlist {
    pub fn new(ranges: Vec<IpNetwork>, permissive: bool) -> Self {
        Self { ranges, permissive }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.allowlist_details.allowed_ranges.clone(),
            !config.environment.is_production(),
        )
    }

    pub fn is_allowed(&self, address: &str) -> bool {
        if self.permissive {
            return true;
        }

        let Ok(ip) = address.parse::<IpAddr>() else {
            return false;
        };

        if ip.is_loopback() {
            return true;
        }

        self.ranges.iter().any(|range| range.contains(ip))
    }
}
