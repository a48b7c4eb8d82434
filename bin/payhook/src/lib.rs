mod observability;

pub mod utility;

pub use payhook_primitives::error::ApiError;

use crate::utility::db_pool::{create_db_pool, run_migrations};
use crate::utility::logging::setup_logging;
use crate::utility::retention::spawn_background_tasks;
use crate::utility::server::serve;
use crate::utility::tasks::{build_router, load_env};
use eyre::{eyre, Report};
use payhook_core::app_state::{AppState, Stores};
use payhook_primitives::models::config::AppConfig;
use tracing::{info, warn};

pub async fn run() -> Result<(), Report> {
    // 1. load environment variables
    load_env();

    // 2. initialize logging first (so we can log everything else)
    setup_logging();

    info!("Starting payhook webhook service...");

    // 3. load configuration
    let config = AppConfig::from_env()?;

    // 4. wire storage
    let stores = match std::env::var("DATABASE_URL") {
        Ok(_) => {
            let pool = create_db_pool()?;
            run_migrations(&pool)?;
            Stores::postgres(pool)
        }
        Err(_) if !config.environment.is_production() => {
            warn!("DATABASE_URL not set; falling back to in-memory stores");
            Stores::in_memory()
        }
        Err(_) => return Err(eyre!("DATABASE_URL must be set in production")),
    };

    // 5. build application state
    let state = AppState::new(stores, config);

    // 6. start background maintenance tasks
    spawn_background_tasks(state.clone());

    // 7. initialize metrics
    let (metric_layer, metric_handle) = observability::metrics::setup_metrics();

    // 8. build axum router
    let app = build_router(state.clone(), metric_layer, metric_handle)?;

    // 9. start HTTP server
    serve(app).await?;

    info!("payhook shut down gracefully");
    Ok(())
}
