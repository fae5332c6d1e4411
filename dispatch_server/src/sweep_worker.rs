use chrono::Duration;
use dispatch_engine::{events::EventProducers, DispatchFlowApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

/// Starts the stale-request sweep worker. Do not await the returned JoinHandle, as it will run
/// indefinitely.
pub fn start_sweep_worker(
    db: SqliteDatabase,
    producers: EventProducers,
    older_than: Duration,
    interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        let api = DispatchFlowApi::new(db, producers);
        info!("🕰️ Stale assignment-request sweep worker started");
        loop {
            timer.tick().await;
            debug!("🕰️ Running stale assignment-request sweep");
            match api.expire_stale_requests(older_than).await {
                Ok(result) if result.expired_count > 0 => {
                    info!("🕰️ {} stale pending requests expired", result.expired_count);
                },
                Ok(_) => {
                    debug!("🕰️ No stale pending requests found");
                },
                Err(e) => {
                    error!("🕰️ Error running stale assignment-request sweep: {e}");
                },
            }
        }
    })
}
