use eyre::{eyre, Report};
use secrecy::SecretString;
use std::env;

/// JWT settings for the operator monitoring surface. Tokens are minted
/// out-of-band; this service only verifies them.
#[derive(Debug, Clone)]
pub struct OperatorInfo {
    pub jwt_secret: SecretString,
    pub jwt_expiration_hours: i64,
    pub jwt_issuer: String,
    pub jwt_audience: String,
}

impl OperatorInfo {
    pub fn new() -> Result<Self, Report> {
        let jwt_secret =
            env::var("OPERATOR_JWT_SECRET").map_err(|_| eyre!("OPERATOR_JWT_SECRET must be set"))?;

        if jwt_secret.len() < 32 {
            return Err(eyre!("OPERATOR_JWT_SECRET must be at least 32 characters long"));
        }

        Ok(Self {
            jwt_secret: SecretString::new(jwt_secret.into()),

            jwt_expiration_hours: env::var("OPERATOR_JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "12".into())
                .parse()
                .map_err(|e| eyre!("Invalid OPERATOR_JWT_EXPIRATION_HOURS: {e}"))?,

            jwt_issuer: env::var("OPERATOR_JWT_ISSUER").unwrap_or_else(|_| "payhook".into()),

            jwt_audience: env::var("OPERATOR_JWT_AUDIENCE")
                .unwrap_or_else(|_| "payhook_ops".into()),
        })
    }
}
