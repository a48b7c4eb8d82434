use crate::models::entities::enum_types::PaymentStatus;
use axum::response::{IntoResponse, Response};
use diesel::r2d2;
use http::StatusCode;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    RateLimited { retry_after_secs: u64 },
    SourceNotAllowed(String),
    SignatureInvalid(String),
    PayloadMalformed(Vec<String>),
    DuplicateEvent(String),
    OrderNotFound(String),
    AmountMismatch { expected: i64, actual: i64 },
    IllegalTransition { from: PaymentStatus, to: PaymentStatus },
    Auth(String),
    NotFound(String),
    Database(diesel::result::Error),
    DatabaseConnection(String),
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::RateLimited { retry_after_secs } => {
                write!(f, "Rate limit exceeded, retry after {}s", retry_after_secs)
            }
            ApiError::SourceNotAllowed(addr) => write!(f, "Source not allowed: {}", addr),
            ApiError::SignatureInvalid(e) => write!(f, "Invalid webhook signature: {}", e),
            ApiError::PayloadMalformed(errors) => {
                write!(f, "Webhook validation failed: {}", errors.join("; "))
            }
            ApiError::DuplicateEvent(key) => write!(f, "Duplicate event: {}", key),
            ApiError::OrderNotFound(reference) => {
                write!(f, "Order not found for reference: {}", reference)
            }
            ApiError::AmountMismatch { expected, actual } => {
                write!(f, "Amount mismatch: expected {}, got {}", expected, actual)
            }
            ApiError::IllegalTransition { from, to } => {
                write!(f, "Illegal payment state transition: {} -> {}", from, to)
            }
            ApiError::Auth(e) => write!(f, "Authentication error: {}", e),
            ApiError::NotFound(e) => write!(f, "Not found: {}", e),
            ApiError::Database(e) => write!(f, "Database error: {}", e),
            ApiError::DatabaseConnection(e) => write!(f, "Database connection error: {}", e),
            ApiError::Internal(e) => write!(f, "Internal error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<r2d2::Error> for ApiError {
    fn from(err: r2d2::Error) -> Self {
        ApiError::DatabaseConnection(err.to_string())
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(err: diesel::result::Error) -> Self {
        ApiError::Database(err)
    }
}

impl From<ApiError> for (StatusCode, String) {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                format!("Rate limit exceeded, retry after {}s", retry_after_secs),
            ),
            ApiError::SourceNotAllowed(addr) => (
                StatusCode::FORBIDDEN,
                format!("Source not allowed: {}", addr),
            ),
            ApiError::SignatureInvalid(e) => (
                StatusCode::UNAUTHORIZED,
                format!("Invalid webhook signature: {}", e),
            ),
            ApiError::PayloadMalformed(errors) => (
                StatusCode::BAD_REQUEST,
                format!("Webhook validation failed: {}", errors.join("; ")),
            ),
            ApiError::DuplicateEvent(key) => {
                (StatusCode::CONFLICT, format!("Duplicate event: {}", key))
            }
            ApiError::OrderNotFound(reference) => (
                StatusCode::NOT_FOUND,
                format!("Order not found for reference: {}", reference),
            ),
            ApiError::AmountMismatch { expected, actual } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Amount mismatch: expected {}, got {}", expected, actual),
            ),
            ApiError::IllegalTransition { from, to } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Illegal payment state transition: {} -> {}", from, to),
            ),
            ApiError::Auth(e) => (StatusCode::UNAUTHORIZED, format!("Auth error: {}", e)),
            ApiError::NotFound(e) => (StatusCode::NOT_FOUND, format!("Not found: {}", e)),
            ApiError::Database(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
            ),
            ApiError::DatabaseConnection(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database connection error: {}", e),
            ),
            ApiError::Internal(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal error: {}", e),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body): (StatusCode, String) = self.into();
        (status, body).into_response()
    }
}
