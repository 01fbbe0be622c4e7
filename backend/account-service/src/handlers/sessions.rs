/// Device session listing for the "where am I logged in" view
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::sessions;
use crate::error::Result;
use crate::handlers::ApiResponse;
use crate::middleware::CurrentUser;
use crate::models::Session;

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub device: String,
    pub platform: String,
    pub browser: String,
    pub ip_address: Option<String>,
    pub is_current: bool,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            device: session.device.clone(),
            platform: session.platform.clone(),
            browser: session.browser.clone(),
            ip_address: session.ip_address.clone(),
            is_current: session.is_current,
            last_activity_at: session.last_activity_at,
            created_at: session.created_at,
        }
    }
}

pub async fn list_sessions(
    pool: web::Data<PgPool>,
    current: CurrentUser,
) -> Result<HttpResponse> {
    let sessions = sessions::list_for_user(&pool, current.user.id).await?;
    let views: Vec<SessionView> = sessions.iter().map(SessionView::from).collect();

    Ok(HttpResponse::Ok().json(ApiResponse::ok(views)))
}
