pub mod monitor_service;
pub mod webhook_service;
