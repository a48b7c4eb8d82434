use secrecy::SecretString;
use std::env;

pub const DEFAULT_SIGNATURE_HEADER: &str = "x-gateway-signature";

/// Shared-secret configuration for the payment gateway. A missing secret is
/// not a startup error: the endpoint stays up, every delivery fails
/// verification, and the health probe reports unhealthy.
#[derive(Debug, Clone)]
pub struct GatewayInfo {
    pub webhook_secret: Option<SecretString>,
    pub signature_header: String,
}

impl GatewayInfo {
    pub fn new() -> Self {
        Self {
            webhook_secret: env::var("GATEWAY_WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .map(|s| SecretString::new(s.into())),

            signature_header: env::var("GATEWAY_SIGNATURE_HEADER")
                .unwrap_or_else(|_| DEFAULT_SIGNATURE_HEADER.into()),
        }
    }
}

impl Default for GatewayInfo {
    fn default() -> Self {
        Self {
            webhook_secret: None,
            signature_header: DEFAULT_SIGNATURE_HEADER.into(),
        }
    }
}
