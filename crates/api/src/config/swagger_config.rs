use payhook_primitives::models::dtos::monitor_dto::{
    OutcomeCount, WebhookLogPage, WebhookStats,
};
use payhook_primitives::models::dtos::webhook_dto::{HealthStatus, WebhookAck};
use payhook_primitives::models::entities::enum_types::{
    ExternalStatus, OrderStatus, PaymentStatus, WebhookOutcome, WebhookType,
};
use payhook_primitives::models::entities::webhook_log::WebhookLogEntry;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payhook API",
        description = "Payment gateway webhook ingestion and operator monitoring"
    ),
    paths(
        crate::handlers::gateway_webhook::gateway_webhook,
        crate::handlers::webhook_health::webhook_health,
        crate::handlers::list_webhook_logs::list_webhook_logs,
        crate::handlers::webhook_log_detail::webhook_log_detail,
        crate::handlers::webhook_stats::webhook_stats,
        crate::handlers::reprocess_webhook::reprocess_webhook,
    ),
    components(schemas(
        WebhookAck,
        HealthStatus,
        WebhookLogEntry,
        WebhookLogPage,
        WebhookStats,
        OutcomeCount,
        ExternalStatus,
        PaymentStatus,
        OrderStatus,
        WebhookOutcome,
        WebhookType,
    )),
    tags(
        (name = "Webhook", description = "Gateway-facing delivery endpoint"),
        (name = "Monitoring", description = "Operator audit and reprocessing surface"),
    )
)]
pub struct ApiDoc;
