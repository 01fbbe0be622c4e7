/// Bearer token store.
///
/// The raw secret handed to clients is never persisted. The primary key of
/// `access_tokens` is the SHA-256 hex digest of the secret, so a leaked
/// database dump yields nothing replayable.
use crate::error::Result;
use crate::models::AccessToken;
use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

/// Length of the raw secret in alphanumeric characters. 64 characters carry
/// well over 256 bits of entropy.
const SECRET_LENGTH: usize = 64;

/// A freshly minted token together with its raw secret. The secret exists
/// only in this value and in the response it is written into.
#[derive(Debug)]
pub struct MintedToken {
    pub secret: String,
    pub token: AccessToken,
}

fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LENGTH)
        .map(char::from)
        .collect()
}

/// Hash a raw secret into the stored token id
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Mint a new token for a user
pub async fn mint(
    pool: &PgPool,
    user_id: Uuid,
    scopes: &[&str],
    ttl_seconds: Option<i64>,
) -> Result<MintedToken> {
    let secret = generate_secret();
    let id = hash_secret(&secret);
    let now = Utc::now();
    let expires_at = ttl_seconds.map(|secs| now + Duration::seconds(secs));

    let scopes: Vec<String> = scopes.iter().map(|s| s.to_string()).collect();

    let token = sqlx::query_as::<_, AccessToken>(
        r#"
        INSERT INTO access_tokens (id, user_id, scopes, revoked, issued_at, expires_at)
        VALUES ($1, $2, $3, FALSE, $4, $5)
        RETURNING *
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&scopes)
    .bind(now)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(MintedToken { secret, token })
}

/// Look up a non-revoked token by its stored id. Revoked tokens are treated
/// as absent so revocation holds end-to-end at every lookup site.
pub async fn find_active_by_id(pool: &PgPool, id: &str) -> Result<Option<AccessToken>> {
    let token = sqlx::query_as::<_, AccessToken>(
        "SELECT * FROM access_tokens WHERE id = $1 AND revoked = FALSE",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(token)
}

/// Revoke a single token. A one-way transition; revoking an already-revoked
/// token affects zero rows and is not an error.
pub async fn revoke(pool: &PgPool, id: &str) -> Result<()> {
    sqlx::query(
        "UPDATE access_tokens SET revoked = TRUE, revoked_at = $1 WHERE id = $2 AND revoked = FALSE",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Revoke every token owned by a user. Idempotent.
pub async fn revoke_all(pool: &PgPool, user_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE access_tokens SET revoked = TRUE, revoked_at = $1 WHERE user_id = $2 AND revoked = FALSE",
    )
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Delete revoked tokens past the retention window and expired tokens.
/// Maintenance operation for the token reaper.
pub async fn delete_stale(pool: &PgPool, revoked_retention_days: i64) -> Result<u64> {
    let revoked_cutoff = Utc::now() - Duration::days(revoked_retention_days);

    let result = sqlx::query(
        r#"
        DELETE FROM access_tokens
        WHERE (revoked = TRUE AND revoked_at < $1)
           OR (expires_at IS NOT NULL AND expires_at < $2)
        "#,
    )
    .bind(revoked_cutoff)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
