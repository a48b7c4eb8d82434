pub mod enum_types;
pub mod idempotency;
pub mod order;
pub mod rate_counter;
pub mod webhook_log;
