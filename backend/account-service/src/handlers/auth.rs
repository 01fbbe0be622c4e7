/// Authentication endpoints and the login page flow
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use crate::config::Settings;
use crate::error::Result;
use crate::handlers::{ApiResponse, MessageData};
use crate::middleware::{resolve_identity, CurrentUser};
use crate::models::{EndSessionsMode, PublicUser};
use crate::services::context::RequestContext;
use crate::services::mailer::Mailer;
use crate::services::{auth, sso};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    /// Optional SSO callback target; when valid, the response carries a
    /// ready-to-follow redirect URL.
    pub redirect: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub redirect: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LogoutRequest {
    /// When true, session rows are deleted instead of being kept for audit.
    #[serde(default)]
    pub forget_devices: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthData {
    pub user: PublicUser,
    pub access_token: String,
    pub token_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sso_redirect_url: Option<String>,
}

fn session_cookie<'a>(settings: &Settings, value: String) -> Cookie<'a> {
    Cookie::build(settings.session.cookie_name.clone(), value)
        .path("/")
        .http_only(true)
        .secure(settings.session.cookie_secure)
        .same_site(SameSite::Lax)
        .finish()
}

fn clear_session_cookie<'a>(settings: &Settings) -> Cookie<'a> {
    let mut cookie = session_cookie(settings, String::new());
    cookie.set_max_age(CookieDuration::ZERO);
    cookie
}

/// Try to turn an optional redirect parameter into a callback URL. A
/// rejected target downgrades to no redirect rather than failing the login.
async fn optional_sso_redirect(
    pool: &PgPool,
    settings: &Settings,
    user: &crate::models::User,
    redirect: Option<&str>,
    ctx: &RequestContext,
) -> Option<String> {
    let redirect = redirect.filter(|r| !r.is_empty())?;

    match sso::issue_and_redirect(pool, settings, user, redirect, ctx).await {
        Ok(issued) => Some(issued.callback_url),
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "Login redirect not honored");
            None
        }
    }
}

pub async fn login(
    pool: web::Data<PgPool>,
    settings: web::Data<Settings>,
    mailer: web::Data<Mailer>,
    req: HttpRequest,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    body.validate()?;
    let ctx = RequestContext::from_http(&req);

    let authed = auth::login(&pool, &mailer, &settings, &body.email, &body.password, &ctx).await?;

    let sso_redirect_url =
        optional_sso_redirect(&pool, &settings, &authed.user, body.redirect.as_deref(), &ctx).await;

    let data = AuthData {
        user: PublicUser::from(&authed.user),
        access_token: authed.token_secret.clone(),
        token_type: "Bearer",
        sso_redirect_url,
    };

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&settings, authed.token_secret))
        .json(ApiResponse::ok(data)))
}

pub async fn register(
    pool: web::Data<PgPool>,
    settings: web::Data<Settings>,
    mailer: web::Data<Mailer>,
    req: HttpRequest,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    body.validate()?;
    let ctx = RequestContext::from_http(&req);

    let authed = auth::register(&pool, &mailer, &settings, &body.email, &body.password, &ctx).await?;

    let sso_redirect_url =
        optional_sso_redirect(&pool, &settings, &authed.user, body.redirect.as_deref(), &ctx).await;

    let data = AuthData {
        user: PublicUser::from(&authed.user),
        access_token: authed.token_secret.clone(),
        token_type: "Bearer",
        sso_redirect_url,
    };

    Ok(HttpResponse::Created()
        .cookie(session_cookie(&settings, authed.token_secret))
        .json(ApiResponse::ok(data)))
}

pub async fn logout(
    pool: web::Data<PgPool>,
    settings: web::Data<Settings>,
    current: CurrentUser,
    body: Option<web::Json<LogoutRequest>>,
) -> Result<HttpResponse> {
    let request = body.map(|b| b.into_inner()).unwrap_or_default();
    let mode = if request.forget_devices {
        EndSessionsMode::Hard
    } else {
        EndSessionsMode::Soft
    };

    auth::logout(&pool, current.user.id, &current.token.id, mode).await?;

    Ok(HttpResponse::Ok()
        .cookie(clear_session_cookie(&settings))
        .json(ApiResponse::ok(MessageData::new("Logged out"))))
}

pub async fn me(current: CurrentUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(PublicUser::from(&current.user))))
}

pub async fn deactivate(
    pool: web::Data<PgPool>,
    settings: web::Data<Settings>,
    current: CurrentUser,
) -> Result<HttpResponse> {
    auth::deactivate(&pool, current.user.id).await?;

    Ok(HttpResponse::Ok()
        .cookie(clear_session_cookie(&settings))
        .json(ApiResponse::ok(MessageData::new("Account deactivated"))))
}

// ---------------------------------------------------------------------------
// Login page flow
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginPageQuery {
    pub redirect: Option<String>,
    pub force_token: Option<String>,
}

/// Truthiness of the `force_token` query parameter: the usual boolean words
/// in any casing, or any non-zero numeric value.
fn is_truthy(value: Option<&str>) -> bool {
    let Some(value) = value else { return false };
    if matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    ) {
        return true;
    }
    value.parse::<i64>().map(|n| n != 0).unwrap_or(false)
}

fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn redirect_page(callback_url: &str) -> String {
    // The URL is also JSON-encoded for the script context; the meta refresh
    // covers clients with scripting disabled.
    let escaped = html_escape(callback_url);
    let json_url = serde_json::to_string(callback_url).unwrap_or_else(|_| "\"/\"".to_string());
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta http-equiv="refresh" content="0;url={escaped}">
  <title>Redirecting…</title>
</head>
<body>
  <p>Signing you in… <a href="{escaped}">Continue</a></p>
  <script>window.location.replace({json_url});</script>
</body>
</html>
"#
    )
}

fn login_page(redirect: Option<&str>) -> String {
    let redirect_field = redirect
        .map(|r| {
            format!(
                r#"<input type="hidden" name="redirect" value="{}">"#,
                html_escape(r)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Sign in</title>
</head>
<body>
  <h1>Sign in</h1>
  <form method="post" action="/api/v1/auth/login">
    {redirect_field}
    <label>Email <input type="email" name="email" required></label>
    <label>Password <input type="password" name="password" required></label>
    <button type="submit">Sign in</button>
  </form>
</body>
</html>
"#
    )
}

/// `GET /login` — the page-load SSO trigger.
///
/// Authenticated with a truthy `force_token` runs the issue flow and renders
/// a page that forwards the browser to the callback. Authenticated without
/// it goes to the dashboard. Anonymous callers get the login page.
pub async fn login_page_handler(
    pool: web::Data<PgPool>,
    settings: web::Data<Settings>,
    req: HttpRequest,
    query: web::Query<LoginPageQuery>,
) -> Result<HttpResponse> {
    let identity = resolve_identity(&pool, &settings, &req).await?;

    let Some((user, _token)) = identity else {
        return Ok(HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(login_page(query.redirect.as_deref())));
    };

    let force = is_truthy(query.force_token.as_deref());
    let redirect = query.redirect.as_deref().unwrap_or_default();

    if force && !redirect.is_empty() {
        let ctx = RequestContext::from_http(&req);
        let issued = sso::issue_and_redirect(&pool, &settings, &user, redirect, &ctx).await?;

        return Ok(HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(redirect_page(&issued.callback_url)));
    }

    Ok(HttpResponse::Found()
        .insert_header((actix_web::http::header::LOCATION, "/dashboard"))
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_token_truthiness() {
        for value in ["1", "true", "TRUE", "Yes", "oN", "2", "42"] {
            assert!(is_truthy(Some(value)), "expected truthy for {value:?}");
        }
        for value in ["", "0", "false", "no", "off", "maybe"] {
            assert!(!is_truthy(Some(value)), "expected falsy for {value:?}");
        }
        assert!(!is_truthy(None));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }

    #[test]
    fn test_redirect_page_escapes_url() {
        let page = redirect_page("https://x.com/cb?a=1&token=t");
        assert!(page.contains("a=1&amp;token=t"));
        assert!(page.contains(r#"window.location.replace("https://x.com/cb?a=1&token=t")"#));
    }
}
