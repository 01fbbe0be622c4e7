//! Cleanup of revoked and expired bearer tokens, plus stale password reset
//! tokens which ride along on the same cadence.

use crate::db::{password_resets, tokens};
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::interval;

pub async fn run(pool: PgPool, interval_secs: u64, revoked_retention_days: i64) {
    tracing::info!(
        interval_secs,
        revoked_retention_days,
        "Starting token reaper job"
    );

    let mut ticker = interval(Duration::from_secs(interval_secs));
    loop {
        ticker.tick().await;

        match tokens::delete_stale(&pool, revoked_retention_days).await {
            Ok(0) => {}
            Ok(deleted) => tracing::info!(deleted, "Reaped stale access tokens"),
            Err(e) => tracing::error!(error = %e, "Token reaper failed"),
        }

        match password_resets::cleanup(&pool).await {
            Ok(0) => {}
            Ok(deleted) => tracing::info!(deleted, "Reaped stale password reset tokens"),
            Err(e) => tracing::error!(error = %e, "Password reset cleanup failed"),
        }
    }
}
