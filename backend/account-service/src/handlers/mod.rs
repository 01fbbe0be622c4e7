/// HTTP handlers
///
/// Handlers stay thin: extract input, build the request context, delegate to
/// services, wrap the result in the response envelope.
pub mod auth;
pub mod health;
pub mod password;
pub mod sessions;
pub mod sso;

use serde::Serialize;

/// Standard success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Envelope for endpoints that only confirm an action
#[derive(Debug, Serialize)]
pub struct MessageData {
    pub message: String,
}

impl MessageData {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
