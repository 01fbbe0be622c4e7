/// SSO endpoints: token generation, the redirect relay, and validation for
/// relying parties.
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::handlers::ApiResponse;
use crate::middleware::{identity::bearer_token, resolve_identity, CurrentUser};
use crate::models::PublicUser;
use crate::services::context::RequestContext;
use crate::services::sso;

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateTokenRequest {
    #[validate(length(min = 1))]
    pub redirect: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateTokenResponse {
    pub token: String,
    pub redirect_url: String,
    pub callback_url: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ValidateTokenRequest {
    #[validate(length(min = 1))]
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ValidatedIdentity {
    pub user: PublicUser,
}

/// `POST /api/v1/sso/generate-token` — authenticated JSON surface.
pub async fn generate_token(
    pool: web::Data<PgPool>,
    settings: web::Data<Settings>,
    req: HttpRequest,
    current: CurrentUser,
    body: web::Json<GenerateTokenRequest>,
) -> Result<HttpResponse> {
    body.validate()?;
    let ctx = RequestContext::from_http(&req);

    let issued =
        sso::issue_and_redirect(&pool, &settings, &current.user, &body.redirect, &ctx).await?;

    Ok(HttpResponse::Ok().json(GenerateTokenResponse {
        token: issued.token_secret,
        redirect_url: issued.redirect_url,
        callback_url: issued.callback_url,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SsoRedirectQuery {
    pub redirect: Option<String>,
}

/// `GET /sso/redirect` — resolves the caller from bearer header, `_token`
/// query parameter, or session cookie, then relays with a 302.
pub async fn sso_redirect(
    pool: web::Data<PgPool>,
    settings: web::Data<Settings>,
    req: HttpRequest,
    query: web::Query<SsoRedirectQuery>,
) -> Result<HttpResponse> {
    let redirect = query.redirect.clone().unwrap_or_default();

    let Some((user, _token)) = resolve_identity(&pool, &settings, &req).await? else {
        // Anonymous: bounce through the login page, preserving the target.
        let login_url = if redirect.is_empty() {
            "/login".to_string()
        } else {
            format!("/login?redirect={}", urlencoding::encode(&redirect))
        };
        return Ok(HttpResponse::Found()
            .insert_header((actix_web::http::header::LOCATION, login_url))
            .finish());
    };

    let ctx = RequestContext::from_http(&req);
    let issued = sso::issue_and_redirect(&pool, &settings, &user, &redirect, &ctx).await?;

    Ok(HttpResponse::Found()
        .insert_header((actix_web::http::header::LOCATION, issued.callback_url))
        .finish())
}

/// `POST /api/v1/sso/validate-token` — resolve a token to its user.
pub async fn validate_token(
    pool: web::Data<PgPool>,
    body: web::Json<ValidateTokenRequest>,
) -> Result<HttpResponse> {
    body.validate()?;

    let (_token, user) = sso::validate(&pool, &body.token).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(ValidatedIdentity {
        user: PublicUser::from(&user),
    })))
}

/// `POST /api/v1/validate-token` — the same lookup for external relying
/// parties, gated by the shared secret rather than a user token.
pub async fn validate_token_external(
    pool: web::Data<PgPool>,
    settings: web::Data<Settings>,
    req: HttpRequest,
    body: web::Json<ValidateTokenRequest>,
) -> Result<HttpResponse> {
    body.validate()?;

    let presented = bearer_token(&req).ok_or(AppError::Unauthenticated)?;
    if !constant_time_eq(presented, &settings.auth.relying_party_secret) {
        return Err(AppError::Unauthenticated);
    }

    let (_token, user) = sso::validate(&pool, &body.token).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(ValidatedIdentity {
        user: PublicUser::from(&user),
    })))
}

/// Length-independent comparison for the shared secret.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();

    let mut diff = a.len() ^ b.len();
    for i in 0..a.len().min(b.len()) {
        diff |= (a[i] ^ b[i]) as usize;
    }
    diff == 0
}
