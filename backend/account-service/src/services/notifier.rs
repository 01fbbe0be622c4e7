//! Notification dispatch.
//!
//! Decides between sending immediately and queueing a scheduled row, based
//! on the user's delivery frequency. The frequency is honored at dispatch
//! time; the global email toggle is re-checked at send time by whoever
//! performs the send, not here.

use crate::db::notifications;
use crate::error::Result;
use crate::models::{MailPayload, NotificationFrequency, User};
use crate::services::mailer::Mailer;
use chrono::{Duration, Utc};
use sqlx::PgPool;

/// Deliver or queue a notification for a user according to their frequency
/// preference.
pub async fn dispatch(
    pool: &PgPool,
    mailer: &Mailer,
    user: &User,
    payload: MailPayload,
) -> Result<()> {
    match user.notification_frequency {
        NotificationFrequency::Never => Ok(()),
        NotificationFrequency::Immediate => {
            if !user.email_notifications {
                return Ok(());
            }
            mailer.send_payload(&user.email, &payload).await
        }
        NotificationFrequency::Daily => queue(pool, user, payload, Duration::days(1)).await,
        NotificationFrequency::Weekly => queue(pool, user, payload, Duration::weeks(1)).await,
    }
}

async fn queue(pool: &PgPool, user: &User, payload: MailPayload, delay: Duration) -> Result<()> {
    let event_key = payload.event_key();
    let value = serde_json::to_value(&payload)
        .map_err(|e| crate::error::AppError::Internal(e.to_string()))?;

    notifications::schedule(pool, user.id, event_key, value, Utc::now() + delay).await?;

    tracing::debug!(user_id = %user.id, event_key, "Queued scheduled notification");
    Ok(())
}
