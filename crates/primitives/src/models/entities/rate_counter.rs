use crate::schema::rate_counters;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Fixed-window request counter, one row per source key.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = rate_counters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RateCounter {
    pub source_key: String,
    pub window_start: DateTime<Utc>,
    pub count: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = rate_counters)]
pub struct NewRateCounter {
    pub source_key: String,
    pub window_start: DateTime<Utc>,
    pub count: i32,
}
