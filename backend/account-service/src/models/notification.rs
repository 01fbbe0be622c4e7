use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A deferred email job. `payload` records which mail to build and its
/// arguments; `sent_at` doubles as the claim marker for the sweep.
#[derive(Debug, Clone, FromRow)]
pub struct ScheduledNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_key: String,
    pub payload: serde_json::Value,
    pub scheduled_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Serialized description of a mail to send later. The tag selects the mail
/// class, the fields are its constructor arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mailer", rename_all = "snake_case")]
pub enum MailPayload {
    LoginAlert {
        device: String,
        platform: String,
        browser: String,
        ip_address: Option<String>,
        logged_in_at: DateTime<Utc>,
    },
    PasswordChanged {
        changed_at: DateTime<Utc>,
    },
}

impl MailPayload {
    pub fn event_key(&self) -> &'static str {
        match self {
            MailPayload::LoginAlert { .. } => "login_alert",
            MailPayload::PasswordChanged { .. } => "password_changed",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            MailPayload::LoginAlert { .. } => "New login to your Herime account",
            MailPayload::PasswordChanged { .. } => "Your Herime password was changed",
        }
    }

    pub fn body(&self) -> String {
        match self {
            MailPayload::LoginAlert {
                device,
                platform,
                browser,
                ip_address,
                logged_in_at,
            } => format!(
                "A new login to your account was detected.\n\n\
                 Device: {} ({})\nBrowser: {}\nIP address: {}\nTime: {}\n\n\
                 If this was not you, please reset your password immediately.",
                device,
                platform,
                browser,
                ip_address.as_deref().unwrap_or("unknown"),
                logged_in_at.to_rfc3339(),
            ),
            MailPayload::PasswordChanged { changed_at } => format!(
                "Your account password was changed on {}.\n\n\
                 If this was not you, please contact support immediately.",
                changed_at.to_rfc3339(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_round_trips_through_json() {
        let payload = MailPayload::LoginAlert {
            device: "Desktop".into(),
            platform: "Linux".into(),
            browser: "Firefox".into(),
            ip_address: Some("203.0.113.7".into()),
            logged_in_at: Utc::now(),
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["mailer"], "login_alert");

        let back: MailPayload = serde_json::from_value(value).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_malformed_payload_is_an_error_not_a_panic() {
        let result: Result<MailPayload, _> =
            serde_json::from_value(serde_json::json!({"mailer": "unknown_mail"}));
        assert!(result.is_err());
    }
}
