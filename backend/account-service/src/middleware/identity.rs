//! Caller identity resolution.
//!
//! Two surfaces share this module. API endpoints use the `CurrentUser`
//! extractor, which accepts only the Authorization bearer header. The
//! page-load flows call `resolve_identity`, which tries bearer header, then
//! the `_token` query parameter, then the web session cookie, in that fixed
//! order. There is no ambient current-user lookup anywhere.

use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;
use sqlx::PgPool;

use crate::config::Settings;
use crate::db::{sessions, users};
use crate::error::{AppError, Result};
use crate::models::{AccessToken, User};
use crate::services::token_resolver;

/// The authenticated caller of an API endpoint, with the token that
/// authenticated it.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: AccessToken,
}

/// Bearer token from the Authorization header, if any
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn query_token(req: &HttpRequest) -> Option<String> {
    url::form_urlencoded::parse(req.query_string().as_bytes())
        .find(|(key, _)| key == "_token")
        .map(|(_, value)| value.into_owned())
}

fn cookie_token(req: &HttpRequest, cookie_name: &str) -> Option<String> {
    req.cookie(cookie_name).map(|c| c.value().to_string())
}

async fn authenticate(pool: &PgPool, raw: &str) -> Result<Option<(User, AccessToken)>> {
    let Some(token) = token_resolver::resolve(pool, raw).await? else {
        return Ok(None);
    };
    if !token.is_active() {
        return Ok(None);
    }

    let Some(user) = users::find_by_id(pool, token.user_id).await? else {
        return Ok(None);
    };
    if !user.active {
        return Ok(None);
    }

    Ok(Some((user, token)))
}

/// Resolve the caller from the request's credential sources in priority
/// order: bearer header, `_token` query parameter, session cookie. A source
/// that is present but does not authenticate falls through to the next one.
pub async fn resolve_identity(
    pool: &PgPool,
    settings: &Settings,
    req: &HttpRequest,
) -> Result<Option<(User, AccessToken)>> {
    let candidates = [
        bearer_token(req).map(str::to_string),
        query_token(req),
        cookie_token(req, &settings.session.cookie_name),
    ];

    for raw in candidates.into_iter().flatten() {
        if let Some(found) = authenticate(pool, &raw).await? {
            return Ok(Some(found));
        }
    }

    Ok(None)
}

fn touch_session(pool: PgPool, token_id: String) {
    tokio::spawn(async move {
        if let Err(e) = sessions::touch_by_token(&pool, &token_id).await {
            tracing::debug!(error = %e, "Failed to refresh session activity");
        }
    });
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let pool = req
                .app_data::<web::Data<PgPool>>()
                .ok_or_else(|| AppError::Internal("Database pool not configured".to_string()))?
                .get_ref()
                .clone();

            let raw = bearer_token(&req).ok_or(AppError::Unauthenticated)?;

            let (user, token) = authenticate(&pool, raw)
                .await?
                .ok_or(AppError::Unauthenticated)?;

            touch_session(pool, token.id.clone());

            Ok(CurrentUser { user, token })
        })
    }
}
