pub mod auth;
pub mod context;
pub mod device;
pub mod mailer;
pub mod notifier;
pub mod redirect_guard;
pub mod sso;
pub mod token_resolver;
