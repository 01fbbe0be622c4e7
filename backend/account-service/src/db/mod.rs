pub mod notifications;
pub mod password_resets;
pub mod sessions;
pub mod tokens;
pub mod users;
