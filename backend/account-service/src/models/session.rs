use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A human-visible device record, one per login event. Distinct from the
/// bearer token that created it; either may outlive the other.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Random unguessable identifier, unique across all sessions.
    pub session_id: String,
    /// Token that was minted alongside this session, when known.
    #[serde(skip_serializing)]
    pub token_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device: String,
    pub platform: String,
    pub browser: String,
    pub is_current: bool,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What logout does with the session rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndSessionsMode {
    /// Flip everything to not-current, keep rows for the audit trail.
    Soft,
    /// Delete the rows outright.
    Hard,
}
