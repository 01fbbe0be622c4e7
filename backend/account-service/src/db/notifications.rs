/// Scheduled notification queue operations
use crate::error::Result;
use crate::models::ScheduledNotification;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Queue a deferred notification
pub async fn schedule(
    pool: &PgPool,
    user_id: Uuid,
    event_key: &str,
    payload: serde_json::Value,
    scheduled_at: DateTime<Utc>,
) -> Result<ScheduledNotification> {
    let notification = sqlx::query_as::<_, ScheduledNotification>(
        r#"
        INSERT INTO scheduled_notifications (id, user_id, event_key, payload, scheduled_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(event_key)
    .bind(payload)
    .bind(scheduled_at)
    .fetch_one(pool)
    .await?;

    Ok(notification)
}

/// Due, unsent notifications up to the batch cap
pub async fn due_batch(pool: &PgPool, limit: i64) -> Result<Vec<ScheduledNotification>> {
    let batch = sqlx::query_as::<_, ScheduledNotification>(
        r#"
        SELECT * FROM scheduled_notifications
        WHERE sent_at IS NULL AND scheduled_at <= NOW()
        ORDER BY scheduled_at
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(batch)
}

/// Claim a notification for delivery by stamping `sent_at` up front.
/// Returns false when another runner already took it. The stamp is permanent
/// whatever the delivery outcome; there is no retry queue.
pub async fn claim(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE scheduled_notifications SET sent_at = $1 WHERE id = $2 AND sent_at IS NULL",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
