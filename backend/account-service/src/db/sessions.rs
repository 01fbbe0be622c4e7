/// Session registry.
///
/// Invariant: at most one session per user has `is_current = TRUE`. Creation
/// always demotes every prior session and inserts the new row inside a single
/// transaction, so the invariant survives a login racing a logout.
use crate::error::Result;
use crate::models::{EndSessionsMode, Session};
use crate::services::device::DeviceInfo;
use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sqlx::PgPool;
use uuid::Uuid;

/// Session identifiers are 64 alphanumeric characters, comfortably above the
/// 32 bytes of entropy required for unguessability.
const SESSION_ID_LENGTH: usize = 64;

fn generate_session_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Create a session for a fresh login, demoting all previous sessions first.
pub async fn start_session(
    pool: &PgPool,
    user_id: Uuid,
    token_id: Option<&str>,
    device: &DeviceInfo,
) -> Result<Session> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    // Unconditional demotion, even when no prior session exists.
    sqlx::query("UPDATE sessions SET is_current = FALSE, updated_at = $1 WHERE user_id = $2")
        .bind(now)
        .bind(user_id)
        .execute(tx.as_mut())
        .await?;

    let session = sqlx::query_as::<_, Session>(
        r#"
        INSERT INTO sessions (
            id, user_id, session_id, token_id, ip_address, user_agent,
            device, platform, browser, is_current, last_activity_at,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, $10, $10, $10)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(generate_session_id())
    .bind(token_id)
    .bind(device.ip_address.as_deref())
    .bind(device.user_agent.as_deref())
    .bind(&device.device)
    .bind(&device.platform)
    .bind(&device.browser)
    .bind(now)
    .fetch_one(tx.as_mut())
    .await?;

    tx.commit().await?;

    Ok(session)
}

/// End every session for a user. Soft mode keeps the rows for the audit
/// trail; hard mode deletes them.
pub async fn end_all(pool: &PgPool, user_id: Uuid, mode: EndSessionsMode) -> Result<u64> {
    let result = match mode {
        EndSessionsMode::Soft => {
            sqlx::query(
                r#"
                UPDATE sessions
                SET is_current = FALSE, last_activity_at = $1, updated_at = $1
                WHERE user_id = $2
                "#,
            )
            .bind(Utc::now())
            .bind(user_id)
            .execute(pool)
            .await?
        }
        EndSessionsMode::Hard => {
            sqlx::query("DELETE FROM sessions WHERE user_id = $1")
                .bind(user_id)
                .execute(pool)
                .await?
        }
    };

    Ok(result.rows_affected())
}

/// List sessions for a user, newest activity first
pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Session>> {
    let sessions = sqlx::query_as::<_, Session>(
        "SELECT * FROM sessions WHERE user_id = $1 ORDER BY last_activity_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(sessions)
}

/// Refresh last-activity for the session tied to a bearer token
pub async fn touch_by_token(pool: &PgPool, token_id: &str) -> Result<()> {
    let now = Utc::now();

    sqlx::query(
        "UPDATE sessions SET last_activity_at = $1, updated_at = $1 WHERE token_id = $2",
    )
    .bind(now)
    .bind(token_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// True when the user already has a session from this platform and browser.
/// Used to decide whether a login deserves a new-device alert.
pub async fn device_seen(
    pool: &PgPool,
    user_id: Uuid,
    platform: &str,
    browser: &str,
) -> Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sessions WHERE user_id = $1 AND platform = $2 AND browser = $3",
    )
    .bind(user_id)
    .bind(platform)
    .bind(browser)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Delete sessions idle past the timeout. Sessions that never saw activity
/// age out from their creation time, which last_activity_at is seeded with.
pub async fn delete_stale(pool: &PgPool, idle_timeout_minutes: i64) -> Result<u64> {
    let cutoff = Utc::now() - Duration::minutes(idle_timeout_minutes);

    let result = sqlx::query("DELETE FROM sessions WHERE last_activity_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
