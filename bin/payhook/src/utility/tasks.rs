use axum::routing::get;
use axum::Router;
use axum_prometheus::{metrics_exporter_prometheus::PrometheusHandle, PrometheusMetricLayer};
use eyre::Report;
use http::HeaderValue;
use payhook_core::AppState;
use std::env;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub fn build_cors() -> Result<CorsLayer, Report> {
    let origins = env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into());

    let allowed_origins = origins
        .split(',')
        .map(|s| s.trim().parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| eyre::eyre!("Invalid CORS origin: {}", e))?;

    Ok(CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(allowed_origins))
}

pub fn load_env() {
    if dotenvy::dotenv().is_ok() {
        info!("Loaded .env file");
    } else {
        info!("No .env file found, using system environment");
    }
}

pub fn build_router(
    state: Arc<AppState>,
    metric_layer: PrometheusMetricLayer<'static>,
    metric_handle: PrometheusHandle,
) -> Result<Router, Report> {
    let cors = build_cors()?;

    let metrics_route =
        Router::new().route("/metrics", get(move || async move { metric_handle.render() }));

    Ok(payhook_api::app::create_router(state)
        .merge(metrics_route)
        .layer(metric_layer)
        .layer(cors))
}
