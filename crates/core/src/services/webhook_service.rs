//! The delivery pipeline: rate limit, allowlist, signature, validation,
//! dedup, classification, state transition, audit. Every stage past the
//! allowlist writes its outcome to the audit log even on failure, and
//! business rejections come back as reports, not errors; only store
//! failures propagate as `Err` so the gateway sees a 5xx worth retrying.

use crate::app_state::AppState;
use crate::classifier;
use crate::fingerprint;
use crate::payload;
use crate::signature;
use crate::state_machine::{self, StateError};
use chrono::{DateTime, Utc};
use payhook_primitives::error::ApiError;
use payhook_primitives::models::dtos::webhook_dto::ParsedPaymentEvent;
use payhook_primitives::models::entities::enum_types::{
    MappedStatus, WebhookOutcome, WebhookType,
};
use payhook_primitives::models::entities::order::Order;
use payhook_primitives::models::entities::webhook_log::NewWebhookLogEntry;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

/// One HTTP delivery, as handed over by the endpoint. Ephemeral; only its
/// derived form is persisted.
#[derive(Debug, Clone)]
pub struct InboundNotification {
    pub raw_body: Vec<u8>,
    pub declared_signature: Option<String>,
    pub source_address: String,
    pub received_at: DateTime<Utc>,
    /// Back-reference to the audit entry being reprocessed, when this
    /// delivery was triggered by an operator rather than the gateway.
    pub retry_of: Option<Uuid>,
}

#[derive(Debug)]
pub struct DeliveryReport {
    pub outcome: WebhookOutcome,
    pub webhook_id: Option<Uuid>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub retry_after_secs: Option<u64>,
}

impl DeliveryReport {
    pub fn success(&self) -> bool {
        matches!(
            self.outcome,
            WebhookOutcome::Processed | WebhookOutcome::Duplicate
        )
    }

    fn processed(webhook_id: Option<Uuid>, message: &str) -> Self {
        Self {
            outcome: WebhookOutcome::Processed,
            webhook_id,
            message: Some(message.to_string()),
            error: None,
            retry_after_secs: None,
        }
    }

    fn duplicate(webhook_id: Option<Uuid>) -> Self {
        Self {
            outcome: WebhookOutcome::Duplicate,
            webhook_id,
            message: Some("Duplicate webhook, already processed".to_string()),
            error: None,
            retry_after_secs: None,
        }
    }

    fn rejected(outcome: WebhookOutcome, webhook_id: Option<Uuid>, error: impl Into<String>) -> Self {
        Self {
            outcome,
            webhook_id,
            message: None,
            error: Some(error.into()),
            retry_after_secs: None,
        }
    }

    fn rate_limited(webhook_id: Option<Uuid>, retry_after_secs: u64) -> Self {
        Self {
            outcome: WebhookOutcome::RateLimited,
            webhook_id,
            message: None,
            error: Some("Rate limit exceeded".to_string()),
            retry_after_secs: Some(retry_after_secs),
        }
    }
}

/// Accumulates audit-entry fields as the pipeline learns them.
struct LogDraft {
    id: Uuid,
    received_at: DateTime<Utc>,
    source_address: String,
    signature_valid: bool,
    raw_payload_digest: String,
    stored_payload: Option<Value>,
    declared_signature: Option<String>,
    idempotency_key: Option<String>,
    payment_reference: Option<String>,
    webhook_type: Option<WebhookType>,
    order_id: Option<Uuid>,
    amount_minor_units: Option<i64>,
    retry_of: Option<Uuid>,
}

impl LogDraft {
    fn new(delivery: &InboundNotification, raw_payload_digest: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            received_at: delivery.received_at,
            source_address: delivery.source_address.clone(),
            signature_valid: false,
            raw_payload_digest,
            stored_payload: None,
            declared_signature: delivery.declared_signature.clone(),
            idempotency_key: None,
            payment_reference: None,
            webhook_type: None,
            order_id: None,
            amount_minor_units: None,
            retry_of: delivery.retry_of,
        }
    }

    fn entry(self, outcome: WebhookOutcome, error_detail: Option<String>) -> NewWebhookLogEntry {
        NewWebhookLogEntry {
            id: self.id,
            received_at: self.received_at,
            source_address: self.source_address,
            signature_valid: self.signature_valid,
            raw_payload_digest: self.raw_payload_digest,
            stored_payload: self.stored_payload,
            declared_signature: self.declared_signature,
            idempotency_key: self.idempotency_key,
            payment_reference: self.payment_reference,
            webhook_type: self.webhook_type,
            order_id: self.order_id,
            amount_minor_units: self.amount_minor_units,
            outcome,
            error_detail,
            retry_of: self.retry_of,
        }
    }
}

enum ApplyResult {
    Applied { order: Order, changed: bool },
    NotFound,
    Rejected { order: Order, error: StateError },
    Conflict { order: Order },
}

pub struct WebhookService;

impl WebhookService {
    /// Full pipeline for a fresh gateway delivery.
    pub async fn process_delivery(
        state: &AppState,
        delivery: InboundNotification,
    ) -> Result<DeliveryReport, ApiError> {
        let decision = state.rate_limiter.allow(&delivery.source_address).await;
        if !decision.allowed {
            warn!(
                "Rate limit exceeded for source {}",
                delivery.source_address
            );
            let draft = LogDraft::new(&delivery, fingerprint::sha256_hex(&delivery.raw_body));
            let id = Self::append_log(
                state,
                draft.entry(
                    WebhookOutcome::RateLimited,
                    Some("Rate limit exceeded".to_string()),
                ),
            )
            .await;
            return Ok(DeliveryReport::rate_limited(id, decision.retry_after_secs));
        }

        if !state.allowlist.is_allowed(&delivery.source_address) {
            warn!(
                "Rejected webhook from unlisted source {}",
                delivery.source_address
            );
            let draft = LogDraft::new(&delivery, fingerprint::sha256_hex(&delivery.raw_body));
            let detail = format!("Source not allowed: {}", delivery.source_address);
            let id = Self::append_log(
                state,
                draft.entry(WebhookOutcome::RejectedSource, Some(detail.clone())),
            )
            .await;
            return Ok(DeliveryReport::rejected(
                WebhookOutcome::RejectedSource,
                id,
                detail,
            ));
        }

        Self::process_from_signature(state, delivery).await
    }

    /// Pipeline entry for operator reprocessing: same guards as a fresh
    /// delivery from signature verification onward, no privileged bypass.
    pub async fn process_from_signature(
        state: &AppState,
        delivery: InboundNotification,
    ) -> Result<DeliveryReport, ApiError> {
        let digest = fingerprint::sha256_hex(&delivery.raw_body);
        let fields = payload::decode_object(&delivery.raw_body);
        let mut draft = LogDraft::new(&delivery, digest);

        let secret = state.config.gateway_details.webhook_secret.as_ref();
        let declared = delivery.declared_signature.as_deref();
        draft.signature_valid =
            signature::verify_signature(secret, &delivery.raw_body, fields.as_ref(), declared);

        if !draft.signature_valid {
            let detail = if secret.is_none() {
                "No webhook secret configured"
            } else if declared.is_none() {
                "Missing webhook signature header"
            } else {
                "Signature verification failed"
            };
            warn!("Rejected webhook from {}: {}", delivery.source_address, detail);
            let id = Self::append_log(
                state,
                draft.entry(WebhookOutcome::RejectedSignature, Some(detail.to_string())),
            )
            .await;
            return Ok(DeliveryReport::rejected(
                WebhookOutcome::RejectedSignature,
                id,
                detail,
            ));
        }

        let Some(fields) = fields else {
            let id = Self::append_log(
                state,
                draft.entry(
                    WebhookOutcome::RejectedPayload,
                    Some(payload::ERR_INVALID_JSON.to_string()),
                ),
            )
            .await;
            return Ok(DeliveryReport::rejected(
                WebhookOutcome::RejectedPayload,
                id,
                payload::ERR_INVALID_JSON,
            ));
        };

        let event = match payload::validate_payload(&fields, delivery.received_at) {
            Ok(event) => event,
            Err(errors) => {
                let detail = errors.join("; ");
                warn!("Webhook validation failed: {}", detail);
                let id = Self::append_log(
                    state,
                    draft.entry(WebhookOutcome::RejectedPayload, Some(detail.clone())),
                )
                .await;
                return Ok(DeliveryReport::rejected(
                    WebhookOutcome::RejectedPayload,
                    id,
                    detail,
                ));
            }
        };

        draft.stored_payload = Some(payload::sanitize_payload(&fields));
        draft.payment_reference = Some(event.reference.clone());
        draft.amount_minor_units = Some(event.amount_minor_units);

        let key = fingerprint::event_fingerprint(&event);
        draft.idempotency_key = Some(key.clone());

        let (mapped, webhook_type) = classifier::classify_status(event.external_status);
        draft.webhook_type = Some(webhook_type);

        let reservation = match state
            .stores
            .dedup
            .check_and_reserve(&key, delivery.received_at)
            .await
        {
            Ok(reservation) => reservation,
            Err(e) => {
                Self::log_internal(state, draft, &e).await;
                return Err(e);
            }
        };

        if !reservation.is_new {
            info!("Duplicate webhook for fingerprint {}", key);
            let id = Self::append_log(state, draft.entry(WebhookOutcome::Duplicate, None)).await;
            return Ok(DeliveryReport::duplicate(id));
        }

        // The reservation is held from here on: it survives only a
        // processed conclusion, so a corrected redelivery or an operator
        // reprocess can retry anything else.
        match Self::resolve_and_apply(state, &event, mapped).await {
            Ok(ApplyResult::Applied { order, changed }) => {
                draft.order_id = Some(order.id);
                if let Err(e) = state
                    .stores
                    .dedup
                    .finalize(&key, WebhookOutcome::Processed)
                    .await
                {
                    let _ = state.stores.dedup.release(&key).await;
                    Self::log_internal(state, draft, &e).await;
                    return Err(e);
                }

                let message = if changed {
                    "Webhook processed successfully"
                } else {
                    "Notification recorded, no state change"
                };
                info!(
                    "Processed {} webhook for order {} ({})",
                    webhook_type, order.id, event.reference
                );
                let id = Self::append_log(state, draft.entry(WebhookOutcome::Processed, None)).await;
                Ok(DeliveryReport::processed(id, message))
            }
            Ok(ApplyResult::NotFound) => {
                let _ = state.stores.dedup.release(&key).await;
                let detail = format!("Order not found for reference: {}", event.reference);
                warn!("{}", detail);
                let id = Self::append_log(
                    state,
                    draft.entry(WebhookOutcome::OrderNotFound, Some(detail.clone())),
                )
                .await;
                Ok(DeliveryReport::rejected(
                    WebhookOutcome::OrderNotFound,
                    id,
                    detail,
                ))
            }
            Ok(ApplyResult::Rejected { order, error }) => {
                let _ = state.stores.dedup.release(&key).await;
                draft.order_id = Some(order.id);
                let (outcome, detail) = match error {
                    StateError::AmountMismatch { expected, actual } => (
                        WebhookOutcome::AmountMismatch,
                        format!("Amount mismatch: expected {expected}, got {actual}"),
                    ),
                    StateError::IllegalTransition { from, to } => (
                        WebhookOutcome::RejectedTransition,
                        format!("Illegal payment state transition: {from} -> {to}"),
                    ),
                };
                warn!("Webhook for order {} rejected: {}", order.id, detail);
                let id =
                    Self::append_log(state, draft.entry(outcome, Some(detail.clone()))).await;
                Ok(DeliveryReport::rejected(outcome, id, detail))
            }
            Ok(ApplyResult::Conflict { order }) => {
                let _ = state.stores.dedup.release(&key).await;
                draft.order_id = Some(order.id);
                let detail = "Concurrent state change, transition not applied".to_string();
                warn!("Webhook for order {} rejected: {}", order.id, detail);
                let id = Self::append_log(
                    state,
                    draft.entry(WebhookOutcome::RejectedTransition, Some(detail.clone())),
                )
                .await;
                Ok(DeliveryReport::rejected(
                    WebhookOutcome::RejectedTransition,
                    id,
                    detail,
                ))
            }
            Err(e) => {
                let _ = state.stores.dedup.release(&key).await;
                Self::log_internal(state, draft, &e).await;
                Err(e)
            }
        }
    }

    async fn resolve_and_apply(
        state: &AppState,
        event: &ParsedPaymentEvent,
        mapped: MappedStatus,
    ) -> Result<ApplyResult, ApiError> {
        let orders = &state.stores.orders;

        let mut order = orders.find_by_payment_reference(&event.reference).await?;
        if order.is_none() {
            // Some reference formats wrap the order id in prefix/suffix
            // codes; fall back to the embedded identifier.
            if let Some(embedded) = payload::extract_order_id(&event.reference) {
                order = orders.find_by_id(embedded).await?;
            }
        }
        let Some(order) = order else {
            return Ok(ApplyResult::NotFound);
        };

        let plan = match state_machine::plan_transition(
            &order,
            mapped,
            event,
            state.config.limit_details.amount_tolerance_minor_units,
        ) {
            Ok(plan) => plan,
            Err(error) => return Ok(ApplyResult::Rejected { order, error }),
        };

        if plan.to.is_none() {
            return Ok(ApplyResult::Applied {
                order,
                changed: false,
            });
        }

        if orders.apply_transition(order.id, &plan).await? {
            Ok(ApplyResult::Applied {
                order,
                changed: true,
            })
        } else {
            Ok(ApplyResult::Conflict { order })
        }
    }

    /// Audit writes are best-effort: losing a log line must not turn an
    /// otherwise-classified delivery into a 5xx.
    async fn append_log(state: &AppState, entry: NewWebhookLogEntry) -> Option<Uuid> {
        let id = entry.id;
        match state.stores.webhook_logs.append(entry).await {
            Ok(()) => Some(id),
            Err(e) => {
                error!("Failed to append webhook audit entry: {}", e);
                None
            }
        }
    }

    async fn log_internal(state: &AppState, draft: LogDraft, cause: &ApiError) {
        error!("Webhook processing failed: {}", cause);
        let _ = Self::append_log(
            state,
            draft.entry(WebhookOutcome::InternalError, Some(cause.to_string())),
        )
        .await;
    }
}
