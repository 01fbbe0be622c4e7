//! User-agent sniffing for session device labels.
//!
//! Deliberately a static ordered rule table, not a UA-parsing library. Each
//! table is scanned top to bottom with case-sensitive substring matching and
//! the first hit wins. Labels feed the "where am I logged in" display only,
//! so the known quirks of substring matching (a Chrome UA also contains
//! "Safari", an Android UA also contains "Linux") are acceptable.

const UNKNOWN: &str = "Unknown";

const PLATFORM_RULES: &[(&str, &str)] = &[
    ("Windows", "Windows"),
    ("Mac", "Mac"),
    ("Linux", "Linux"),
    ("Android", "Android"),
    ("iPhone", "iPhone"),
    ("iPad", "iPad"),
];

const BROWSER_RULES: &[(&str, &str)] = &[
    ("Chrome", "Chrome"),
    ("Firefox", "Firefox"),
    ("Safari", "Safari"),
    ("Edge", "Edge"),
];

const DEVICE_RULES: &[(&str, &str)] = &[
    ("iPad", "Tablet"),
    ("Tablet", "Tablet"),
    ("iPhone", "Mobile"),
    ("Android", "Mobile"),
    ("Mobile", "Mobile"),
];

fn first_match(rules: &[(&str, &str)], user_agent: &str, default: &str) -> String {
    rules
        .iter()
        .find(|(needle, _)| user_agent.contains(needle))
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| default.to_string())
}

/// Request-scoped device facts captured at login time.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device: String,
    pub platform: String,
    pub browser: String,
}

impl DeviceInfo {
    pub fn from_request_parts(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        let ua = user_agent.as_deref().unwrap_or("");
        Self {
            device: first_match(DEVICE_RULES, ua, "Desktop"),
            platform: first_match(PLATFORM_RULES, ua, UNKNOWN),
            browser: first_match(BROWSER_RULES, ua, UNKNOWN),
            ip_address,
            user_agent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_LINUX: &str =
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
    const FIREFOX_WINDOWS: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const SAFARI_IPHONE: &str =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Version/17.0 Mobile/15E148 Safari/604.1";

    #[test]
    fn test_first_match_wins_over_later_rules() {
        // A Chrome UA also contains "Safari"; Chrome is listed first.
        let info = DeviceInfo::from_request_parts(None, Some(CHROME_LINUX.to_string()));
        assert_eq!(info.browser, "Chrome");
        assert_eq!(info.platform, "Linux");
        assert_eq!(info.device, "Desktop");
    }

    #[test]
    fn test_windows_firefox() {
        let info = DeviceInfo::from_request_parts(None, Some(FIREFOX_WINDOWS.to_string()));
        assert_eq!(info.browser, "Firefox");
        assert_eq!(info.platform, "Windows");
    }

    #[test]
    fn test_iphone_is_mobile() {
        let info = DeviceInfo::from_request_parts(None, Some(SAFARI_IPHONE.to_string()));
        assert_eq!(info.device, "Mobile");
        // "Mac" appears before "iPhone" in the platform table and the UA
        // contains "like Mac OS X", so the label is Mac. Preserved behavior.
        assert_eq!(info.platform, "Mac");
        assert_eq!(info.browser, "Safari");
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let info = DeviceInfo::from_request_parts(None, Some("windows chrome".to_string()));
        assert_eq!(info.platform, "Unknown");
        assert_eq!(info.browser, "Unknown");
    }

    #[test]
    fn test_missing_user_agent_defaults() {
        let info = DeviceInfo::from_request_parts(None, None);
        assert_eq!(info.device, "Desktop");
        assert_eq!(info.platform, "Unknown");
        assert_eq!(info.browser, "Unknown");
    }
}
