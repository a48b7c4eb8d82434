//! Operator authentication for the monitoring surface. HS256 bearer tokens
//! with issuer/audience validation; tokens are minted out-of-band, so there
//! is no login flow here.

use crate::app_state::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{Duration, Utc};
use http::HeaderMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use payhook_primitives::error::ApiError;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // operator id
    pub exp: i64,    // expiration time
    pub iat: i64,    // issued at
    pub iss: String,
    pub aud: String,
    pub jti: String,
}

pub struct SecurityConfig;

impl SecurityConfig {
    pub fn create_token(
        config: &payhook_primitives::models::config::AppConfig,
        operator: &str,
    ) -> Result<String, ApiError> {
        let now = Utc::now();
        let details = &config.operator_details;

        let claims = Claims {
            sub: operator.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(details.jwt_expiration_hours)).timestamp(),
            iss: details.jwt_issuer.clone(),
            aud: details.jwt_audience.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        encode(
            &header,
            &claims,
            &EncodingKey::from_secret(details.jwt_secret.expose_secret().as_bytes()),
        )
        .map_err(|e| {
            error!("JWT encoding error: {}", e);
            ApiError::Auth("Token creation failed".into())
        })
    }

    fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
        let auth_header = headers
            .get("Authorization")
            .ok_or_else(|| ApiError::Auth("Missing Authorization header".into()))?
            .to_str()
            .map_err(|_| ApiError::Auth("Invalid Authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Auth("Invalid Authorization header".into()))?
            .trim();

        if token.is_empty() {
            return Err(ApiError::Auth("Invalid Authorization header".into()));
        }

        Ok(token.to_string())
    }

    pub fn verify_token(
        config: &payhook_primitives::models::config::AppConfig,
        token: &str,
    ) -> Result<Claims, ApiError> {
        let details = &config.operator_details;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[details.jwt_issuer.as_str()]);
        validation.set_audience(&[details.jwt_audience.as_str()]);
        validation.validate_exp = true;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(details.jwt_secret.expose_secret().as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| ApiError::Auth("Invalid or expired token".into()))
    }

    pub async fn auth_middleware(
        State(state): State<Arc<AppState>>,
        mut req: Request,
        next: Next,
    ) -> Result<Response, Response> {
        let token =
            Self::extract_bearer_token(req.headers()).map_err(|e| e.into_response())?;

        let claims =
            Self::verify_token(&state.config, &token).map_err(|e| e.into_response())?;

        req.extensions_mut().insert(claims);
        Ok(next.run(req).await)
    }
}
