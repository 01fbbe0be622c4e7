/// Password reset token operations
use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

const TOKEN_EXPIRY_HOURS: i64 = 1;
const TOKEN_LENGTH: usize = 40;

/// Raw reset token plus its expiry, returned to the mailer
#[derive(Debug)]
pub struct ResetToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Issue a reset token, invalidating any outstanding ones for the user first
pub async fn create(pool: &PgPool, user_id: Uuid) -> Result<ResetToken> {
    invalidate_for_user(pool, user_id).await?;

    let raw = generate_token();
    let expires_at = Utc::now() + Duration::hours(TOKEN_EXPIRY_HOURS);

    sqlx::query(
        r#"
        INSERT INTO password_resets (id, user_id, token_hash, expires_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(hash_token(&raw))
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(ResetToken {
        token: raw,
        expires_at,
    })
}

/// Resolve a raw reset token to its user, if still valid and unused
pub async fn consume(pool: &PgPool, token: &str) -> Result<Option<Uuid>> {
    let result = sqlx::query_as::<_, (Uuid,)>(
        r#"
        UPDATE password_resets
        SET used = TRUE, used_at = NOW()
        WHERE token_hash = $1
          AND used = FALSE
          AND expires_at > NOW()
        RETURNING user_id
        "#,
    )
    .bind(hash_token(token))
    .fetch_optional(pool)
    .await?;

    Ok(result.map(|(user_id,)| user_id))
}

/// Burn every outstanding token for a user
pub async fn invalidate_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE password_resets SET used = TRUE, used_at = NOW() WHERE user_id = $1 AND used = FALSE",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Drop tokens that expired or were used more than a day ago
pub async fn cleanup(pool: &PgPool) -> Result<u64> {
    let threshold = Utc::now() - Duration::hours(24);

    let result = sqlx::query(
        r#"
        DELETE FROM password_resets
        WHERE expires_at < $1
           OR (used = TRUE AND used_at < $1)
        "#,
    )
    .bind(threshold)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_alphanumeric()));
    }

    #[test]
    fn test_hash_token() {
        let hash = hash_token("reset-token");
        assert_eq!(hash, hash_token("reset-token"));
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, hash_token("another-token"));
    }
}
