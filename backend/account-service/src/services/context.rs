//! Explicit request context.
//!
//! Host, peer address, and user agent are captured once at the HTTP boundary
//! and passed by value, so the redirect and SSO logic stays pure and
//! unit-testable without a running server.

use actix_web::HttpRequest;

use crate::services::device::DeviceInfo;

#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Host the request was served on, without any port.
    pub host: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn from_http(req: &HttpRequest) -> Self {
        let info = req.connection_info();
        Self {
            host: strip_port(info.host()).to_string(),
            ip_address: info.realip_remote_addr().map(strip_port).map(str::to_string),
            user_agent: req
                .headers()
                .get(actix_web::http::header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        }
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo::from_request_parts(self.ip_address.clone(), self.user_agent.clone())
    }
}

/// Drop a trailing `:port` if present. Bracketed IPv6 literals keep their
/// brackets and lose only the port.
fn strip_port(host: &str) -> &str {
    if let Some(end) = host.rfind(']') {
        // [::1]:8080 or [::1]
        return &host[..=end];
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("compte.herime.com"), "compte.herime.com");
        assert_eq!(strip_port("compte.herime.com:8443"), "compte.herime.com");
        assert_eq!(strip_port("127.0.0.1:8080"), "127.0.0.1");
        assert_eq!(strip_port("[::1]:8080"), "[::1]");
        assert_eq!(strip_port("[::1]"), "[::1]");
    }
}
