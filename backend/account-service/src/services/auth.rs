//! Login, registration, logout, and deactivation orchestration.
//!
//! Token issuance is fatal to the flow when it fails; session bookkeeping
//! and notifications are telemetry and never block an otherwise successful
//! authentication. That asymmetry is load-bearing.

use crate::db::{sessions, tokens, users};
use crate::error::{AppError, Result};
use crate::models::token::SCOPE_PROFILE;
use crate::models::{EndSessionsMode, MailPayload, User};
use crate::security::password;
use crate::services::context::RequestContext;
use crate::services::mailer::Mailer;
use crate::services::notifier;
use chrono::Utc;
use sqlx::PgPool;

/// A successful authentication: the user and their fresh bearer token.
#[derive(Debug)]
pub struct Authenticated {
    pub user: User,
    pub token_secret: String,
    pub token_id: String,
}

pub async fn login(
    pool: &PgPool,
    mailer: &Mailer,
    settings: &crate::config::Settings,
    email: &str,
    password_input: &str,
    ctx: &RequestContext,
) -> Result<Authenticated> {
    let user = users::find_by_email(pool, email)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    if !password::verify_password(password_input, &user.password_hash)? {
        tracing::warn!(user_id = %user.id, "Failed login attempt");
        return Err(AppError::Unauthenticated);
    }

    if !user.active {
        return Err(AppError::AccountDisabled);
    }

    let minted = tokens::mint(
        pool,
        user.id,
        &[SCOPE_PROFILE],
        settings.auth.token_ttl_seconds,
    )
    .await?;

    record_login_side_effects(pool, mailer, &user, &minted.token.id, ctx).await;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Authenticated {
        user,
        token_secret: minted.secret,
        token_id: minted.token.id,
    })
}

pub async fn register(
    pool: &PgPool,
    mailer: &Mailer,
    settings: &crate::config::Settings,
    email: &str,
    password_input: &str,
    ctx: &RequestContext,
) -> Result<Authenticated> {
    if users::email_exists(pool, email).await? {
        return Err(AppError::Validation("Email is already registered".to_string()));
    }

    let password_hash = password::hash_password(password_input)?;
    let user = users::insert_user(pool, email, &password_hash).await?;

    let minted = tokens::mint(
        pool,
        user.id,
        &[SCOPE_PROFILE],
        settings.auth.token_ttl_seconds,
    )
    .await?;

    record_login_side_effects(pool, mailer, &user, &minted.token.id, ctx).await;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(Authenticated {
        user,
        token_secret: minted.secret,
        token_id: minted.token.id,
    })
}

/// Best-effort bookkeeping after a successful authentication: last-login
/// metadata, the device session record, and the new-device alert. Failures
/// here are logged and swallowed.
async fn record_login_side_effects(
    pool: &PgPool,
    mailer: &Mailer,
    user: &User,
    token_id: &str,
    ctx: &RequestContext,
) {
    let device = ctx.device_info();

    if let Err(e) = users::record_login(
        pool,
        user.id,
        ctx.ip_address.as_deref(),
        ctx.user_agent.as_deref(),
    )
    .await
    {
        tracing::warn!(user_id = %user.id, error = %e, "Failed to record login metadata");
    }

    let new_device = match sessions::device_seen(pool, user.id, &device.platform, &device.browser)
        .await
    {
        Ok(seen) => !seen,
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to check device history");
            false
        }
    };

    if let Err(e) = sessions::start_session(pool, user.id, Some(token_id), &device).await {
        tracing::warn!(user_id = %user.id, error = %e, "Failed to record session");
    }

    if new_device {
        let payload = MailPayload::LoginAlert {
            device: device.device.clone(),
            platform: device.platform.clone(),
            browser: device.browser.clone(),
            ip_address: device.ip_address.clone(),
            logged_in_at: Utc::now(),
        };
        if let Err(e) = notifier::dispatch(pool, mailer, user, payload).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to dispatch login alert");
        }
    }
}

/// End every session and revoke every token for a user. A session without a
/// revoked token is a security gap, so the two always travel together.
pub async fn end_all_sessions(pool: &PgPool, user_id: uuid::Uuid, mode: EndSessionsMode) -> Result<()> {
    let revoked = tokens::revoke_all(pool, user_id).await?;
    let ended = sessions::end_all(pool, user_id, mode).await?;

    tracing::info!(user_id = %user_id, revoked, ended, mode = ?mode, "Ended all sessions");
    Ok(())
}

/// Logout: revoke the presenting token, then everything else.
pub async fn logout(
    pool: &PgPool,
    user_id: uuid::Uuid,
    token_id: &str,
    mode: EndSessionsMode,
) -> Result<()> {
    tokens::revoke(pool, token_id).await?;
    end_all_sessions(pool, user_id, mode).await?;

    tracing::info!(user_id = %user_id, "User logged out");
    Ok(())
}

/// Self-service deactivation. The account keeps its rows but every
/// credential dies with it.
pub async fn deactivate(pool: &PgPool, user_id: uuid::Uuid) -> Result<()> {
    users::set_active(pool, user_id, false).await?;
    end_all_sessions(pool, user_id, EndSessionsMode::Hard).await?;

    tracing::info!(user_id = %user_id, "Account deactivated");
    Ok(())
}
