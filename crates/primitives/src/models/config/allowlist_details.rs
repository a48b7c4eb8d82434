use eyre::{eyre, Report};
use ipnetwork::IpNetwork;
use std::env;

/// Published egress ranges of the payment gateway.
pub const DEFAULT_GATEWAY_RANGES: &[&str] = &["196.33.252.0/24", "41.203.154.0/24"];

#[derive(Debug, Clone)]
pub struct AllowlistInfo {
    pub allowed_ranges: Vec<IpNetwork>,
}

impl AllowlistInfo {
    pub fn new() -> Result<Self, Report> {
        match env::var("GATEWAY_ALLOWED_RANGES") {
            Ok(raw) => Self::parse(&raw),
            Err(_) => Self::defaults(),
        }
    }

    pub fn defaults() -> Result<Self, Report> {
        Self::parse(&DEFAULT_GATEWAY_RANGES.join(","))
    }

    fn parse(raw: &str) -> Result<Self, Report> {
        let allowed_ranges = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<IpNetwork>()
                    .map_err(|e| eyre!("Invalid allowlist range {s:?}: {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { allowed_ranges })
    }
}
