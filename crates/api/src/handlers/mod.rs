pub mod gateway_webhook;
pub mod list_webhook_logs;
pub mod reprocess_webhook;
pub mod webhook_health;
pub mod webhook_log_detail;
pub mod webhook_stats;
