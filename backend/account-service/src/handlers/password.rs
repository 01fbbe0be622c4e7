/// Password reset endpoints.
///
/// Both endpoints answer with the same generic message whether or not the
/// email exists, so responses cannot be used to enumerate accounts.
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use crate::db::{password_resets, users};
use crate::error::{AppError, Result};
use crate::handlers::{ApiResponse, MessageData};
use crate::models::{EndSessionsMode, MailPayload};
use crate::security::password;
use crate::services::mailer::Mailer;
use crate::services::{auth, notifier};

const RESET_REQUESTED_MESSAGE: &str =
    "If that email is registered, a reset link has been sent to it";

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 8))]
    pub password: String,
}

pub async fn forgot_password(
    pool: web::Data<PgPool>,
    mailer: web::Data<Mailer>,
    body: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse> {
    body.validate()?;

    match users::find_by_email(&pool, &body.email).await? {
        Some(user) if user.active => {
            let reset = password_resets::create(&pool, user.id).await?;
            // Mail delivery is best-effort; the response stays generic so a
            // transport hiccup does not reveal the account either.
            if let Err(e) = mailer.send_password_reset(&user.email, &reset.token).await {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to send reset email");
            }
        }
        _ => {
            tracing::debug!("Password reset requested for unknown or inactive email");
        }
    }

    Ok(HttpResponse::Ok().json(ApiResponse::ok(MessageData::new(RESET_REQUESTED_MESSAGE))))
}

pub async fn reset_password(
    pool: web::Data<PgPool>,
    mailer: web::Data<Mailer>,
    body: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse> {
    body.validate()?;

    let user_id = password_resets::consume(&pool, &body.token)
        .await?
        .ok_or_else(|| AppError::Validation("Invalid or expired reset token".to_string()))?;

    let password_hash = password::hash_password(&body.password)?;
    users::update_password(&pool, user_id, &password_hash).await?;

    // A credential change kills every outstanding token and session.
    auth::end_all_sessions(&pool, user_id, EndSessionsMode::Soft).await?;

    if let Some(user) = users::find_by_id(&pool, user_id).await? {
        let payload = MailPayload::PasswordChanged {
            changed_at: Utc::now(),
        };
        if let Err(e) = notifier::dispatch(&pool, &mailer, &user, payload).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to dispatch password change notice");
        }
    }

    tracing::info!(user_id = %user_id, "Password reset completed");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(MessageData::new("Password has been reset"))))
}
