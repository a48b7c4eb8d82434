use chrono::Utc;
use payhook_core::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, error, info};

const HOURLY_PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub fn spawn_background_tasks(state: Arc<AppState>) {
    // An idempotency record only guards redeliveries of a live event; past
    // the retention window the event cannot recur, so the record is dead
    // weight.
    tokio::spawn(async move {
        info!("Starting hourly idempotency retention task");
        prune_idempotency_records(state).await;
    });

    info!("Background maintenance tasks spawned");
}

async fn prune_idempotency_records(state: Arc<AppState>) {
    let mut interval = interval(HOURLY_PRUNE_INTERVAL);
    interval.tick().await;

    loop {
        interval.tick().await;

        let cutoff =
            Utc::now() - chrono::Duration::hours(state.config.limit_details.dedup_retention_hours);

        match state.stores.dedup.prune_older_than(cutoff).await {
            Ok(0) => debug!("No expired idempotency records"),
            Ok(n) => info!("Removed {} idempotency records", n),
            Err(e) => error!("Idempotency retention failed: {}", e),
        }
    }
}
