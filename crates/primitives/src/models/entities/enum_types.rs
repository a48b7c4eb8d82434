use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use std::io::Write;
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Stored as lowercase text columns; round-trips through strum.
macro_rules! impl_text_enum_sql {
    ($ty:ty) => {
        impl ToSql<Text, Pg> for $ty {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_ref().as_bytes())?;
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $ty {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                let raw = std::str::from_utf8(bytes.as_bytes())?;
                raw.parse::<$ty>()
                    .map_err(|_| format!("unrecognized enum value: {raw}").into())
            }
        }
    };
}

/// Status vocabulary the gateway uses on the wire. Exact literals, so no
/// case normalization here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum ExternalStatus {
    Approved,
    Declined,
    Cancelled,
    Pending,
    Failed,
    Refunded,
    Chargeback,
}

/// Payment leg of the order lifecycle.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    AsExpression,
    FromSqlRow,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Pending,
    Paid,
    Failed,
    Cancelled,
    Refunded,
    Chargeback,
}

/// Broader order lifecycle. Webhook processing only ever drives the subset
/// below; everything else belongs to the order subsystem.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    AsExpression,
    FromSqlRow,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Active,
    Suspended,
    Cancelled,
    Disputed,
}

/// What a gateway status means for the order's payment state. `Unknown` is
/// the defensive bucket for vocabulary we do not recognize.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MappedStatus {
    Paid,
    Failed,
    Cancelled,
    Pending,
    Refunded,
    Chargeback,
    Unknown,
}

impl MappedStatus {
    /// The persisted payment status this mapped status drives the order to.
    /// `Unknown` drives nothing.
    pub fn as_payment_status(self) -> Option<PaymentStatus> {
        match self {
            MappedStatus::Paid => Some(PaymentStatus::Paid),
            MappedStatus::Failed => Some(PaymentStatus::Failed),
            MappedStatus::Cancelled => Some(PaymentStatus::Cancelled),
            MappedStatus::Pending => Some(PaymentStatus::Pending),
            MappedStatus::Refunded => Some(PaymentStatus::Refunded),
            MappedStatus::Chargeback => Some(PaymentStatus::Chargeback),
            MappedStatus::Unknown => None,
        }
    }
}

/// Coarse event class used for downstream notification routing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    AsExpression,
    FromSqlRow,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WebhookType {
    PaymentSuccess,
    PaymentFailure,
    PaymentPending,
    Refund,
    Chargeback,
    Notify,
}

/// Terminal classification of one delivery attempt, as persisted in the
/// audit log and exposed to the monitoring surface.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsExpression,
    FromSqlRow,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WebhookOutcome {
    Processed,
    Duplicate,
    RejectedSignature,
    RejectedSource,
    RejectedPayload,
    OrderNotFound,
    RateLimited,
    AmountMismatch,
    RejectedTransition,
    InternalError,
}

impl_text_enum_sql!(PaymentStatus);
impl_text_enum_sql!(OrderStatus);
impl_text_enum_sql!(WebhookType);
impl_text_enum_sql!(WebhookOutcome);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn payment_status_round_trips_through_text() {
        for status in [
            PaymentStatus::Unpaid,
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Cancelled,
            PaymentStatus::Refunded,
            PaymentStatus::Chargeback,
        ] {
            let text = status.to_string();
            assert_eq!(PaymentStatus::from_str(&text).unwrap(), status);
        }
    }

    #[test]
    fn external_status_uses_gateway_literals() {
        assert_eq!(ExternalStatus::from_str("Approved").unwrap(), ExternalStatus::Approved);
        assert!(ExternalStatus::from_str("approved").is_err());
        assert!(ExternalStatus::from_str("Bogus").is_err());
    }

    #[test]
    fn outcome_serializes_snake_case() {
        assert_eq!(WebhookOutcome::RejectedSignature.to_string(), "rejected_signature");
        assert_eq!(WebhookType::PaymentSuccess.to_string(), "payment_success");
    }
}
