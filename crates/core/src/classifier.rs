//! Gateway status vocabulary mapped onto the internal payment lifecycle and
//! the coarse event class used for downstream notification routing. Both
//! tables are total; vocabulary we do not recognize degrades to
//! `unknown`/`notify` instead of failing.

use payhook_primitives::models::entities::enum_types::{
    ExternalStatus, MappedStatus, WebhookType,
};
use std::str::FromStr;

pub fn map_gateway_status(status: ExternalStatus) -> MappedStatus {
    match status {
        ExternalStatus::Approved => MappedStatus::Paid,
        ExternalStatus::Declined => MappedStatus::Failed,
        ExternalStatus::Cancelled => MappedStatus::Cancelled,
        ExternalStatus::Pending => MappedStatus::Pending,
        ExternalStatus::Failed => MappedStatus::Failed,
        ExternalStatus::Refunded => MappedStatus::Refunded,
        ExternalStatus::Chargeback => MappedStatus::Chargeback,
    }
}

pub fn webhook_type_for(status: ExternalStatus) -> WebhookType {
    match status {
        ExternalStatus::Approved => WebhookType::PaymentSuccess,
        ExternalStatus::Declined => WebhookType::PaymentFailure,
        ExternalStatus::Cancelled => WebhookType::Notify,
        ExternalStatus::Pending => WebhookType::PaymentPending,
        ExternalStatus::Failed => WebhookType::PaymentFailure,
        ExternalStatus::Refunded => WebhookType::Refund,
        ExternalStatus::Chargeback => WebhookType::Chargeback,
    }
}

pub fn classify_status(status: ExternalStatus) -> (MappedStatus, WebhookType) {
    (map_gateway_status(status), webhook_type_for(status))
}

/// String-level entry point for callers holding unvalidated vocabulary.
pub fn classify_raw(status: &str) -> (MappedStatus, WebhookType) {
    match ExternalStatus::from_str(status) {
        Ok(status) => classify_status(status),
        Err(_) => (MappedStatus::Unknown, WebhookType::Notify),
    }
}
