//! Transition policy for the payment leg of an order.
//!
//! The payment status moves `unpaid → pending → {paid, failed}`, with the
//! retry path `failed → pending|paid` (and the same retry path out of
//! `cancelled`). Once `paid`, only `refunded` or `chargeback` may follow.
//! Moving backwards out of a terminal success class is rejected and
//! surfaced, never silently dropped.

use chrono::{DateTime, Utc};
use payhook_primitives::error::ApiError;
use payhook_primitives::models::dtos::webhook_dto::ParsedPaymentEvent;
use payhook_primitives::models::entities::enum_types::{MappedStatus, OrderStatus, PaymentStatus};
use payhook_primitives::models::entities::order::Order;

#[derive(Debug, PartialEq)]
pub enum StateError {
    AmountMismatch { expected: i64, actual: i64 },
    IllegalTransition { from: PaymentStatus, to: PaymentStatus },
}

impl From<StateError> for ApiError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::AmountMismatch { expected, actual } => {
                ApiError::AmountMismatch { expected, actual }
            }
            StateError::IllegalTransition { from, to } => ApiError::IllegalTransition { from, to },
        }
    }
}

/// What the store should do to the order row. `to: None` means the
/// notification is recorded with no state change (unknown vocabulary, or a
/// redelivery of the status the order is already in).
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    pub from: PaymentStatus,
    pub to: Option<PaymentStatus>,
    pub order_status: Option<OrderStatus>,
    pub gateway_transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_error: Option<String>,
}

impl TransitionPlan {
    fn noop(from: PaymentStatus) -> Self {
        Self {
            from,
            to: None,
            order_status: None,
            gateway_transaction_id: None,
            paid_at: None,
            payment_error: None,
        }
    }
}

fn is_permitted(from: PaymentStatus, to: PaymentStatus) -> bool {
    use PaymentStatus::*;

    matches!(
        (from, to),
        (Unpaid, Pending | Paid | Failed | Cancelled)
            | (Pending, Paid | Failed | Cancelled)
            | (Failed, Pending | Paid)
            | (Cancelled, Pending | Paid)
            | (Paid, Refunded | Chargeback)
    )
}

/// Order-lifecycle side effect of entering a payment status.
fn lifecycle_for(to: PaymentStatus) -> Option<OrderStatus> {
    match to {
        PaymentStatus::Paid => Some(OrderStatus::Active),
        PaymentStatus::Failed => Some(OrderStatus::Pending),
        PaymentStatus::Refunded => Some(OrderStatus::Cancelled),
        PaymentStatus::Chargeback => Some(OrderStatus::Disputed),
        PaymentStatus::Unpaid | PaymentStatus::Pending | PaymentStatus::Cancelled => None,
    }
}

pub fn plan_transition(
    order: &Order,
    mapped: MappedStatus,
    event: &ParsedPaymentEvent,
    amount_tolerance_minor_units: i64,
) -> Result<TransitionPlan, StateError> {
    let from = order.payment_status;

    let Some(to) = mapped.as_payment_status() else {
        return Ok(TransitionPlan::noop(from));
    };

    if to == from {
        return Ok(TransitionPlan::noop(from));
    }

    if !is_permitted(from, to) {
        return Err(StateError::IllegalTransition { from, to });
    }

    // A stale or tampered notification must not credit the wrong amount.
    if to == PaymentStatus::Paid {
        let delta = (event.amount_minor_units - order.total_amount_minor_units).abs();
        if delta > amount_tolerance_minor_units {
            return Err(StateError::AmountMismatch {
                expected: order.total_amount_minor_units,
                actual: event.amount_minor_units,
            });
        }
    }

    let payment_error = match to {
        PaymentStatus::Failed => Some(
            event
                .response_text
                .clone()
                .unwrap_or_else(|| "Payment declined".to_string()),
        ),
        _ => None,
    };

    Ok(TransitionPlan {
        from,
        to: Some(to),
        order_status: lifecycle_for(to),
        gateway_transaction_id: event.transaction_id.clone(),
        paid_at: (to == PaymentStatus::Paid).then_some(event.occurred_at),
        payment_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use payhook_primitives::models::entities::enum_types::ExternalStatus;
    use uuid::Uuid;

    fn order(payment_status: PaymentStatus, total: i64) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            payment_reference: "REF-1".into(),
            payment_status,
            order_status: OrderStatus::Pending,
            total_amount_minor_units: total,
            gateway_transaction_id: None,
            paid_at: None,
            payment_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn event(amount: i64) -> ParsedPaymentEvent {
        ParsedPaymentEvent {
            reference: "REF-1".into(),
            transaction_id: Some("TX-9".into()),
            external_status: ExternalStatus::Approved,
            amount_minor_units: amount,
            occurred_at: Utc::now(),
            response_text: None,
        }
    }

    #[test]
    fn unpaid_order_can_be_paid() {
        let plan =
            plan_transition(&order(PaymentStatus::Unpaid, 10000), MappedStatus::Paid, &event(10000), 0)
                .unwrap();

        assert_eq!(plan.to, Some(PaymentStatus::Paid));
        assert_eq!(plan.order_status, Some(OrderStatus::Active));
        assert!(plan.paid_at.is_some());
        assert_eq!(plan.gateway_transaction_id.as_deref(), Some("TX-9"));
    }

    #[test]
    fn failed_order_can_retry_into_paid() {
        let plan =
            plan_transition(&order(PaymentStatus::Failed, 10000), MappedStatus::Paid, &event(10000), 0)
                .unwrap();
        assert_eq!(plan.to, Some(PaymentStatus::Paid));
    }

    #[test]
    fn paid_order_cannot_fail() {
        let err =
            plan_transition(&order(PaymentStatus::Paid, 10000), MappedStatus::Failed, &event(10000), 0)
                .unwrap_err();
        assert_eq!(
            err,
            StateError::IllegalTransition {
                from: PaymentStatus::Paid,
                to: PaymentStatus::Failed
            }
        );
    }

    #[test]
    fn refunded_order_cannot_be_paid_again() {
        let err = plan_transition(
            &order(PaymentStatus::Refunded, 10000),
            MappedStatus::Paid,
            &event(10000),
            0,
        )
        .unwrap_err();
        assert!(matches!(err, StateError::IllegalTransition { .. }));
    }

    #[test]
    fn paid_order_can_be_refunded_and_charged_back() {
        for (mapped, lifecycle) in [
            (MappedStatus::Refunded, OrderStatus::Cancelled),
            (MappedStatus::Chargeback, OrderStatus::Disputed),
        ] {
            let plan =
                plan_transition(&order(PaymentStatus::Paid, 10000), mapped, &event(10000), 0)
                    .unwrap();
            assert_eq!(plan.order_status, Some(lifecycle));
        }
    }

    #[test]
    fn amount_mismatch_blocks_payment() {
        let err =
            plan_transition(&order(PaymentStatus::Unpaid, 10000), MappedStatus::Paid, &event(9000), 0)
                .unwrap_err();
        assert_eq!(
            err,
            StateError::AmountMismatch {
                expected: 10000,
                actual: 9000
            }
        );
    }

    #[test]
    fn amount_within_tolerance_is_accepted() {
        let plan =
            plan_transition(&order(PaymentStatus::Unpaid, 10000), MappedStatus::Paid, &event(9999), 1)
                .unwrap();
        assert_eq!(plan.to, Some(PaymentStatus::Paid));
    }

    #[test]
    fn amount_is_not_checked_for_refunds() {
        // Partial refunds are legitimate; only crediting is amount-guarded.
        let plan = plan_transition(
            &order(PaymentStatus::Paid, 10000),
            MappedStatus::Refunded,
            &event(5000),
            0,
        )
        .unwrap();
        assert_eq!(plan.to, Some(PaymentStatus::Refunded));
    }

    #[test]
    fn same_status_redelivery_is_a_noop() {
        let plan =
            plan_transition(&order(PaymentStatus::Paid, 10000), MappedStatus::Paid, &event(10000), 0)
                .unwrap();
        assert_eq!(plan.to, None);
    }

    #[test]
    fn unknown_status_is_a_noop() {
        let plan = plan_transition(
            &order(PaymentStatus::Unpaid, 10000),
            MappedStatus::Unknown,
            &event(10000),
            0,
        )
        .unwrap();
        assert_eq!(plan.to, None);
    }

    #[test]
    fn declined_payment_records_failure_evidence() {
        let mut declined = event(10000);
        declined.response_text = Some("Insufficient funds".into());

        let plan = plan_transition(
            &order(PaymentStatus::Pending, 10000),
            MappedStatus::Failed,
            &declined,
            0,
        )
        .unwrap();

        assert_eq!(plan.to, Some(PaymentStatus::Failed));
        assert_eq!(plan.order_status, Some(OrderStatus::Pending));
        assert_eq!(plan.payment_error.as_deref(), Some("Insufficient funds"));
    }
}
