//! Scheduled notification sweep.
//!
//! Periodically drains due, unsent notification rows and attempts exactly
//! one delivery each. A row is claimed by stamping `sent_at` before the
//! send, so a second runner can never pick it up; the stamp stays whatever
//! the delivery outcome, there is no retry queue.

use crate::db::{notifications, users};
use crate::error::Result;
use crate::models::MailPayload;
use crate::services::mailer::Mailer;
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::interval;

/// Upper bound on rows processed per sweep, to bound cycle time.
const BATCH_SIZE: i64 = 200;

#[derive(Debug, Default)]
pub struct SweepStats {
    pub processed: u64,
    pub sent: u64,
    pub skipped: u64,
    pub failed: u64,
}

pub async fn run(pool: PgPool, mailer: Mailer, interval_secs: u64) {
    tracing::info!(interval_secs, "Starting notification sweep job");

    let mut ticker = interval(Duration::from_secs(interval_secs));
    loop {
        ticker.tick().await;

        match sweep_once(&pool, &mailer).await {
            Ok(stats) if stats.processed > 0 => {
                tracing::info!(
                    processed = stats.processed,
                    sent = stats.sent,
                    skipped = stats.skipped,
                    failed = stats.failed,
                    "Notification sweep completed"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "Notification sweep failed");
            }
        }
    }
}

/// One sweep cycle. Delivery preferences are re-checked here, at send time;
/// a user who disabled email after a notification was queued gets nothing,
/// and the row is still consumed.
pub async fn sweep_once(pool: &PgPool, mailer: &Mailer) -> Result<SweepStats> {
    let due = notifications::due_batch(pool, BATCH_SIZE).await?;
    let mut stats = SweepStats::default();

    for notification in due {
        if !notifications::claim(pool, notification.id).await? {
            // Another runner got there first.
            continue;
        }
        stats.processed += 1;

        let user = match users::find_by_id(pool, notification.user_id).await? {
            Some(user) => user,
            None => {
                stats.skipped += 1;
                continue;
            }
        };

        if !user.active || !user.email_notifications {
            stats.skipped += 1;
            continue;
        }

        let payload: MailPayload = match serde_json::from_value(notification.payload.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(
                    notification_id = %notification.id,
                    event_key = %notification.event_key,
                    error = %e,
                    "Unreadable notification payload, dropping"
                );
                stats.failed += 1;
                continue;
            }
        };

        match mailer.send_payload(&user.email, &payload).await {
            Ok(()) => stats.sent += 1,
            Err(e) => {
                // One attempt only; the claim stamp already marked it sent.
                tracing::warn!(
                    notification_id = %notification.id,
                    user_id = %user.id,
                    error = %e,
                    "Notification delivery failed, not retrying"
                );
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}
