use crate::models::entities::enum_types::{OrderStatus, PaymentStatus};
use crate::schema::orders;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Owned by the order subsystem; webhook processing only reads it and moves
/// its payment leg forward.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, ToSchema)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Order {
    pub id: Uuid,
    pub payment_reference: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub total_amount_minor_units: i64,
    pub gateway_transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Deserialize)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub id: Uuid,
    pub payment_reference: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub total_amount_minor_units: i64,
}

impl NewOrder {
    pub fn unpaid(payment_reference: impl Into<String>, total_amount_minor_units: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            payment_reference: payment_reference.into(),
            payment_status: PaymentStatus::Unpaid,
            order_status: OrderStatus::Pending,
            total_amount_minor_units,
        }
    }
}
