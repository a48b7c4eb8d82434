pub mod allowlist_details;
pub mod gateway_details;
pub mod limit_details;
pub mod operator_details;

use crate::models::config::allowlist_details::AllowlistInfo;
use crate::models::config::gateway_details::GatewayInfo;
use crate::models::config::limit_details::LimitInfo;
use crate::models::config::operator_details::OperatorInfo;
use eyre::Report;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Production,
    Development,
    Test,
}

impl FromStr for AppEnv {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "production" | "prod" => AppEnv::Production,
            "test" => AppEnv::Test,
            _ => AppEnv::Development,
        })
    }
}

impl AppEnv {
    pub fn from_env() -> Self {
        env::var("APP_ENV")
            .unwrap_or_default()
            .parse()
            .unwrap_or(AppEnv::Development)
    }

    pub fn is_production(self) -> bool {
        matches!(self, AppEnv::Production)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnv,

    pub gateway_details: GatewayInfo,

    pub allowlist_details: AllowlistInfo,

    pub limit_details: LimitInfo,

    pub operator_details: OperatorInfo,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, Report> {
        Ok(Self {
            environment: AppEnv::from_env(),

            gateway_details: GatewayInfo::new(),

            allowlist_details: AllowlistInfo::new()?,

            limit_details: LimitInfo::new()?,

            operator_details: OperatorInfo::new()?,
        })
    }
}
