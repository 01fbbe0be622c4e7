use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// The single scope issued by this hub.
pub const SCOPE_PROFILE: &str = "profile";

/// Opaque bearer credential. The `id` column is the SHA-256 hex digest of the
/// raw secret; the secret itself is never stored.
#[derive(Debug, Clone, FromRow)]
pub struct AccessToken {
    pub id: String,
    pub user_id: Uuid,
    pub scopes: Vec<String>,
    pub revoked: bool,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// A token authenticates only while unrevoked and unexpired.
    pub fn is_active(&self) -> bool {
        if self.revoked {
            return false;
        }
        match self.expires_at {
            Some(expires_at) => expires_at > Utc::now(),
            None => true,
        }
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}
