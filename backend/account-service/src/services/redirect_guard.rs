//! Open-redirect protection for SSO callback targets.
//!
//! A relying party hands us an arbitrary string and asks us to send a browser
//! there carrying a fresh token. Everything here is fail-closed: any
//! ambiguity about the target resolves to rejection. The guard is a pure
//! function of its inputs; callers log the decision.
//!
//! Comparison is host-only (lower-cased, leading "www." stripped). A target
//! on the current host with a different scheme or port still counts as same
//! domain. That is deliberate, auditable policy.

use url::Url;

/// Upper bound on repeated percent-decoding. Callers double-encode at most
/// once in practice; five rounds is generous.
pub const MAX_DECODE_ITERATIONS: usize = 5;

/// Lower-case a host and strip one leading "www." label.
pub fn normalize_host(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Percent-decode repeatedly, keeping the last form that parses as an
/// absolute URL. Stops at the first idempotent decode, at the iteration
/// bound, or as soon as a decode step breaks a previously valid form.
///
/// A doubly-encoded URL passes through intermediate forms that are not valid
/// URLs, so invalidity alone is not a stop condition until something valid
/// has been seen.
fn deep_decode(raw: &str) -> String {
    let mut current = raw.to_string();
    let mut last_valid = Url::parse(raw).is_ok().then(|| raw.to_string());

    for _ in 0..MAX_DECODE_ITERATIONS {
        let decoded = match urlencoding::decode(&current) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => break,
        };
        if decoded == current {
            break;
        }
        if Url::parse(&decoded).is_ok() {
            last_valid = Some(decoded.clone());
        } else if last_valid.is_some() {
            break;
        }
        current = decoded;
    }

    last_valid.unwrap_or(current)
}

/// Why a candidate redirect target was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Not a syntactically valid absolute URL with scheme and host.
    Malformed,
    /// Host equals the current request host.
    SameDomain,
    /// Host is one of the hub's own domains.
    DeniedHost,
    /// Path points back into the login flow.
    LoginPath,
}

/// Decide whether `raw` may be used as an SSO callback destination from a
/// request served on `current_host`. On approval returns the decoded,
/// parsed target.
pub fn evaluate(
    raw: &str,
    current_host: &str,
    denied_hosts: &[String],
) -> Result<Url, RejectReason> {
    let decoded = deep_decode(raw);

    let url = Url::parse(&decoded).map_err(|_| RejectReason::Malformed)?;

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => normalize_host(host),
        _ => return Err(RejectReason::Malformed),
    };

    if host == normalize_host(current_host) {
        return Err(RejectReason::SameDomain);
    }

    if denied_hosts.iter().any(|denied| normalize_host(denied) == host) {
        return Err(RejectReason::DeniedHost);
    }

    if url.path().contains("/login") {
        return Err(RejectReason::LoginPath);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT_HOST: &str = "compte.herime.com";

    fn denied() -> Vec<String> {
        vec!["compte.herime.com".to_string()]
    }

    fn eval(raw: &str) -> Result<Url, RejectReason> {
        evaluate(raw, CURRENT_HOST, &denied())
    }

    #[test]
    fn test_accepts_plain_external_url() {
        let url = eval("https://academie.herime.com/callback?a=1").unwrap();
        assert_eq!(url.host_str(), Some("academie.herime.com"));
        assert_eq!(url.path(), "/callback");
    }

    #[test]
    fn test_rejects_invalid_urls() {
        for raw in [
            "",
            "not a url",
            "/relative/path",
            "example.com/no-scheme",
            "https://",
            "javascript:alert(1)",
        ] {
            assert!(eval(raw).is_err(), "expected rejection for {raw:?}");
        }
    }

    #[test]
    fn test_rejects_same_domain_case_insensitive_www_stripped() {
        assert_eq!(
            eval("https://www.Compte.Herime.com/x"),
            Err(RejectReason::SameDomain)
        );
        assert_eq!(
            eval("https://compte.herime.com/profile"),
            Err(RejectReason::SameDomain)
        );
    }

    #[test]
    fn test_same_domain_ignores_scheme_and_port() {
        // Host-only comparison by design.
        assert_eq!(
            eval("http://compte.herime.com:8443/x"),
            Err(RejectReason::SameDomain)
        );
    }

    #[test]
    fn test_rejects_denied_host() {
        let denied = vec!["hub.herime.com".to_string()];
        assert_eq!(
            evaluate("https://www.hub.herime.com/x", "other.example", &denied),
            Err(RejectReason::DeniedHost)
        );
    }

    #[test]
    fn test_rejects_login_paths() {
        assert_eq!(
            eval("https://academie.herime.com/login/callback"),
            Err(RejectReason::LoginPath)
        );
        assert_eq!(
            eval("https://academie.herime.com/app/login"),
            Err(RejectReason::LoginPath)
        );
    }

    #[test]
    fn test_query_login_does_not_trip_path_check() {
        assert!(eval("https://academie.herime.com/cb?next=/login").is_ok());
    }

    #[test]
    fn test_single_encoded_input() {
        let url = eval("https%3A%2F%2Facademie.herime.com%2Fcb%3Fa%3D1").unwrap();
        assert_eq!(url.host_str(), Some("academie.herime.com"));
        assert_eq!(url.query(), Some("a=1"));
    }

    #[test]
    fn test_double_encoded_input() {
        let once = urlencoding::encode("https://academie.herime.com/cb?a=1").into_owned();
        let twice = urlencoding::encode(&once).into_owned();
        let url = eval(&twice).unwrap();
        assert_eq!(url.host_str(), Some("academie.herime.com"));
    }

    #[test]
    fn test_decode_is_bounded() {
        let mut encoded = "https://academie.herime.com/cb".to_string();
        for _ in 0..8 {
            encoded = urlencoding::encode(&encoded).into_owned();
        }
        // More encoding layers than the bound: the final form never becomes
        // a valid URL, so the input is rejected rather than looped on.
        assert!(eval(&encoded).is_err());
    }

    #[test]
    fn test_fully_decoded_input_is_unchanged() {
        let raw = "https://academie.herime.com/cb?a=1&b=two words";
        assert_eq!(deep_decode(raw), raw);
    }

    #[test]
    fn test_decode_keeps_last_valid_form() {
        // Decoding "%2541" yields "%41", then "A"; the final step no longer
        // parses as an absolute URL only if syntax broke, which it does not
        // here, so decoding runs to the idempotent point.
        let raw = "https://academie.herime.com/p%2541th";
        let decoded = deep_decode(raw);
        assert_eq!(decoded, "https://academie.herime.com/pAth");
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("WWW.Example.COM"), "example.com");
        assert_eq!(normalize_host("example.com"), "example.com");
        assert_eq!(normalize_host("www.www.example.com"), "www.example.com");
    }
}
