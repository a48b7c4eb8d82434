use crate::config::swagger_config::ApiDoc;
use crate::handlers::{
    gateway_webhook::gateway_webhook, list_webhook_logs::list_webhook_logs,
    reprocess_webhook::reprocess_webhook, webhook_health::webhook_health,
    webhook_log_detail::webhook_log_detail, webhook_stats::webhook_stats,
};
use axum::routing::{get, post};
use axum::{middleware, Router};
use payhook_core::security::SecurityConfig;
use payhook_core::AppState;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn create_router(state: Arc<AppState>) -> Router {
    // gateway-facing routes (no authentication; the pipeline does its own
    // source and signature checks)
    let public_router = create_public_routers();

    // operator monitoring routes (require a bearer token)
    let operator_router = create_operator_routers(&state);

    Router::new()
        .merge(public_router)
        .merge(operator_router)
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024)) // 2MB limit
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}

fn create_public_routers() -> Router<Arc<AppState>> {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/webhook", post(gateway_webhook).get(webhook_health))
}

fn create_operator_routers(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/monitor/webhooks", get(list_webhook_logs))
        .route("/api/monitor/webhooks/stats", get(webhook_stats))
        .route("/api/monitor/webhooks/{id}", get(webhook_log_detail))
        .route(
            "/api/monitor/webhooks/{id}/reprocess",
            post(reprocess_webhook),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            SecurityConfig::auth_middleware,
        ))
}
