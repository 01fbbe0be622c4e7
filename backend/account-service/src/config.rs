//! Configuration for the account service.
//!
//! Settings are read from environment variables, with a `.env` file loaded in
//! debug builds. Every section has its own struct and `from_env` constructor
//! so tests can build sections in isolation.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub session: SessionSettings,
    pub email: EmailSettings,
    pub jobs: JobSettings,
}

impl Settings {
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
        }

        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            server: ServerSettings::from_env()?,
            auth: AuthSettings::from_env()?,
            session: SessionSettings::from_env()?,
            email: EmailSettings::from_env()?,
            jobs: JobSettings::from_env()?,
        })
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("Invalid DATABASE_MIN_CONNECTIONS")?,
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
        })
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid SERVER_PORT")?,
        })
    }
}

/// Token issuance and SSO settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Access token lifetime in seconds. Zero or unset means no forced expiry.
    pub token_ttl_seconds: Option<i64>,
    /// Shared secret presented by relying parties on the external
    /// validate-token endpoint. Distinct from user tokens.
    pub relying_party_secret: String,
    /// Hub-owned hosts that are never acceptable SSO callback targets.
    pub denied_hosts: Vec<String>,
    /// Revoked tokens older than this many days are pruned by the reaper.
    pub prune_revoked_after_days: i64,
}

impl AuthSettings {
    pub fn from_env() -> Result<Self> {
        let token_ttl_seconds = match env::var("AUTH_TOKEN_TTL_SECONDS") {
            Ok(raw) => {
                let secs: i64 = raw.parse().context("Invalid AUTH_TOKEN_TTL_SECONDS")?;
                (secs > 0).then_some(secs)
            }
            Err(_) => None,
        };

        let denied_hosts = env::var("SSO_DENIED_HOSTS")
            .unwrap_or_else(|_| "compte.herime.com".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            token_ttl_seconds,
            relying_party_secret: env::var("RELYING_PARTY_SECRET")
                .context("RELYING_PARTY_SECRET must be set")?,
            denied_hosts,
            prune_revoked_after_days: env::var("AUTH_PRUNE_REVOKED_AFTER_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .context("Invalid AUTH_PRUNE_REVOKED_AFTER_DAYS")?,
        })
    }
}

/// Device session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Cookie carrying the web session token on the page-load flows.
    pub cookie_name: String,
    pub cookie_secure: bool,
    /// Sessions idle longer than this many minutes are reaped.
    pub idle_timeout_minutes: i64,
}

impl SessionSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "hub_token".to_string()),
            cookie_secure: env::var("SESSION_COOKIE_SECURE")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            idle_timeout_minutes: env::var("SESSION_IDLE_TIMEOUT_MINUTES")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .context("Invalid SESSION_IDLE_TIMEOUT_MINUTES")?,
        })
    }
}

/// SMTP settings. An empty host puts the mailer in no-op mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub use_starttls: bool,
    pub password_reset_base_url: Option<String>,
}

impl EmailSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "1025".to_string())
                .parse()
                .context("Invalid SMTP_PORT")?,
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_from: env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@herime.com".to_string()),
            use_starttls: env::var("SMTP_USE_STARTTLS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            password_reset_base_url: env::var("EMAIL_PASSWORD_RESET_BASE_URL").ok(),
        })
    }
}

/// Background job cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSettings {
    pub notification_sweep_interval_secs: u64,
    pub session_reaper_interval_secs: u64,
    pub token_reaper_interval_secs: u64,
}

impl JobSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            notification_sweep_interval_secs: env::var("NOTIFICATION_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("Invalid NOTIFICATION_SWEEP_INTERVAL_SECS")?,
            session_reaper_interval_secs: env::var("SESSION_REAPER_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .context("Invalid SESSION_REAPER_INTERVAL_SECS")?,
            token_reaper_interval_secs: env::var("TOKEN_REAPER_INTERVAL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .context("Invalid TOKEN_REAPER_INTERVAL_SECS")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_settings_from_env() {
        env::set_var("RELYING_PARTY_SECRET", "shared-secret");
        env::set_var("AUTH_TOKEN_TTL_SECONDS", "0");
        env::set_var("SSO_DENIED_HOSTS", "compte.herime.com, hub.herime.com");

        let settings = AuthSettings::from_env().unwrap();

        assert_eq!(settings.relying_party_secret, "shared-secret");
        assert!(settings.token_ttl_seconds.is_none());
        assert_eq!(
            settings.denied_hosts,
            vec!["compte.herime.com", "hub.herime.com"]
        );
        assert_eq!(settings.prune_revoked_after_days, 7);

        env::remove_var("RELYING_PARTY_SECRET");
        env::remove_var("AUTH_TOKEN_TTL_SECONDS");
        env::remove_var("SSO_DENIED_HOSTS");
    }

    #[test]
    fn test_session_settings_defaults() {
        env::remove_var("SESSION_COOKIE_NAME");
        env::remove_var("SESSION_IDLE_TIMEOUT_MINUTES");

        let settings = SessionSettings::from_env().unwrap();

        assert_eq!(settings.cookie_name, "hub_token");
        assert_eq!(settings.idle_timeout_minutes, 120);
    }

    #[test]
    fn test_email_settings_noop_without_host() {
        env::remove_var("SMTP_HOST");
        env::remove_var("SMTP_PORT");

        let settings = EmailSettings::from_env().unwrap();
        assert!(settings.smtp_host.is_empty());
        assert_eq!(settings.smtp_port, 1025);
    }
}
