/// Account Service Library
///
/// Centralized authentication hub: issues bearer tokens, tracks per-device
/// sessions, and relays authenticated browsers to external client sites with
/// a freshly minted single-use credential.
///
/// ## Modules
///
/// - `config`: Service configuration
/// - `db`: Database repositories (users, tokens, sessions, notifications)
/// - `error`: Error types
/// - `handlers`: HTTP endpoints
/// - `jobs`: Background maintenance loops
/// - `middleware`: Caller identity resolution
/// - `models`: Data models
/// - `security`: Password hashing
/// - `services`: Business logic (redirect guard, SSO, mail)
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod security;
pub mod services;

pub use error::{AppError, Result};
