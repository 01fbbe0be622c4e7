//! Hourly cleanup of idle device sessions.

use crate::db::sessions;
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::interval;

pub async fn run(pool: PgPool, interval_secs: u64, idle_timeout_minutes: i64) {
    tracing::info!(
        interval_secs,
        idle_timeout_minutes,
        "Starting session reaper job"
    );

    let mut ticker = interval(Duration::from_secs(interval_secs));
    loop {
        ticker.tick().await;

        match sessions::delete_stale(&pool, idle_timeout_minutes).await {
            Ok(0) => {}
            Ok(deleted) => tracing::info!(deleted, "Reaped idle sessions"),
            Err(e) => tracing::error!(error = %e, "Session reaper failed"),
        }
    }
}
