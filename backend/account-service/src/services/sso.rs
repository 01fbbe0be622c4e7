//! SSO token issuance and validation.
//!
//! The issuer turns an authenticated user plus a candidate redirect URL into
//! a callback URL carrying a freshly minted bearer token. The validator is
//! the relying-party side: it resolves a presented token back to a user.

use crate::config::Settings;
use crate::db::{tokens, users};
use crate::error::{AppError, Result};
use crate::models::token::SCOPE_PROFILE;
use crate::models::{AccessToken, User};
use crate::services::context::RequestContext;
use crate::services::redirect_guard::{self, RejectReason};
use crate::services::token_resolver;
use sqlx::PgPool;
use url::Url;

/// Everything a caller needs after a successful issue: the raw secret, the
/// approved target, and the composed callback.
#[derive(Debug)]
pub struct IssuedRedirect {
    pub token_secret: String,
    pub redirect_url: String,
    pub callback_url: String,
}

/// Rebuild the target URL with the token injected into its query string.
///
/// An existing `token` key is overwritten in place; extra occurrences are
/// dropped so the result carries exactly one. Every other component of the
/// original, fragment included, is preserved.
pub fn compose_callback(target: &Url, token_secret: &str) -> Url {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut replaced = false;

    for (key, value) in target.query_pairs() {
        if key == "token" {
            if !replaced {
                pairs.push(("token".to_string(), token_secret.to_string()));
                replaced = true;
            }
        } else {
            pairs.push((key.into_owned(), value.into_owned()));
        }
    }
    if !replaced {
        pairs.push(("token".to_string(), token_secret.to_string()));
    }

    let mut callback = target.clone();
    callback
        .query_pairs_mut()
        .clear()
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    callback
}

/// Validate the redirect, mint a token, and compose the callback URL.
///
/// The composed URL goes through the guard a second time; parse/recompose
/// discrepancies must never widen what the first check approved.
pub async fn issue_and_redirect(
    pool: &PgPool,
    settings: &Settings,
    user: &User,
    raw_redirect: &str,
    ctx: &RequestContext,
) -> Result<IssuedRedirect> {
    if !user.active {
        return Err(AppError::AccountDisabled);
    }

    if raw_redirect.is_empty() {
        return Err(AppError::InvalidRedirect);
    }

    let target = approve_redirect(raw_redirect, ctx, &settings.auth.denied_hosts, user)?;

    let minted = tokens::mint(
        pool,
        user.id,
        &[SCOPE_PROFILE],
        settings.auth.token_ttl_seconds,
    )
    .await?;

    let callback = compose_callback(&target, &minted.secret);

    // Never trust composition blindly.
    approve_redirect(callback.as_str(), ctx, &settings.auth.denied_hosts, user)?;

    tracing::info!(
        user_id = %user.id,
        target_host = target.host_str().unwrap_or_default(),
        "Issued SSO redirect token"
    );

    Ok(IssuedRedirect {
        token_secret: minted.secret,
        redirect_url: target.into(),
        callback_url: callback.into(),
    })
}

fn approve_redirect(
    raw: &str,
    ctx: &RequestContext,
    denied_hosts: &[String],
    user: &User,
) -> Result<Url> {
    redirect_guard::evaluate(raw, &ctx.host, denied_hosts).map_err(|reason: RejectReason| {
        tracing::warn!(
            user_id = %user.id,
            current_host = %ctx.host,
            reason = ?reason,
            "Rejected SSO redirect target"
        );
        AppError::InvalidRedirect
    })
}

/// Resolve a relying-party-presented token to its owner.
///
/// The token must be unrevoked and unexpired, and the account must still be
/// active. Failures are reported generically.
pub async fn validate(pool: &PgPool, raw_token: &str) -> Result<(AccessToken, User)> {
    let token = token_resolver::resolve(pool, raw_token)
        .await?
        .filter(AccessToken::is_active)
        .ok_or(AppError::Unauthenticated)?;

    let user = users::find_by_id(pool, token.user_id)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    if !user.active {
        return Err(AppError::AccountDisabled);
    }

    Ok((token, user))
}
