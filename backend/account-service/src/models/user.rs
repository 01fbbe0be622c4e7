use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Role enum matching database user_role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
    SuperUser,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
            UserRole::SuperUser => "super_user",
        }
    }
}

/// How often the user wants notification emails delivered.
///
/// Anything other than `Immediate` defers delivery to a scheduled
/// notification row consumed by the periodic sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "notification_frequency", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationFrequency {
    Immediate,
    Daily,
    Weekly,
    Never,
}

/// User model - the identity root
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub active: bool,
    pub role: UserRole,
    pub email_notifications: bool,
    pub notification_frequency: NotificationFrequency,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    pub last_login_user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Projection of a user that is safe to serialize in API responses.
/// The full `User` carries the password hash and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub active: bool,
    pub role: UserRole,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            active: user.active,
            role: user.role,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}
