//! Redirect guard acceptance and rejection properties.

use account_service::services::redirect_guard::{evaluate, RejectReason};

const CURRENT_HOST: &str = "compte.herime.com";

fn denied() -> Vec<String> {
    vec!["compte.herime.com".to_string(), "hub.herime.com".to_string()]
}

#[test]
fn malformed_inputs_are_always_rejected() {
    let cases = [
        "",
        " ",
        "no scheme here",
        "http//missing-colon.example",
        "://no-scheme.example",
        "https://",
        "mailto:user@example.com",
        "data:text/html,hello",
        "/relative",
        "%%%%%",
    ];
    for raw in cases {
        assert!(
            evaluate(raw, CURRENT_HOST, &denied()).is_err(),
            "expected rejection for {raw:?}"
        );
    }
}

#[test]
fn same_domain_is_rejected_case_insensitively_and_www_stripped() {
    assert_eq!(
        evaluate("https://www.Compte.Herime.com/x", CURRENT_HOST, &denied()),
        Err(RejectReason::SameDomain)
    );
    assert_eq!(
        evaluate("https://COMPTE.HERIME.COM/", CURRENT_HOST, &denied()),
        Err(RejectReason::SameDomain)
    );
}

#[test]
fn scheme_and_port_do_not_rescue_a_same_domain_target() {
    for raw in [
        "http://compte.herime.com/cb",
        "https://compte.herime.com:9443/cb",
        "ftp://compte.herime.com/cb",
    ] {
        assert_eq!(
            evaluate(raw, CURRENT_HOST, &denied()),
            Err(RejectReason::SameDomain),
            "input {raw:?}"
        );
    }
}

#[test]
fn login_paths_are_rejected_anywhere_in_the_path() {
    assert_eq!(
        evaluate(
            "https://academie.herime.com/login/callback",
            CURRENT_HOST,
            &denied()
        ),
        Err(RejectReason::LoginPath)
    );
    assert_eq!(
        evaluate(
            "https://academie.herime.com/sso/login",
            CURRENT_HOST,
            &denied()
        ),
        Err(RejectReason::LoginPath)
    );
}

#[test]
fn denylisted_hub_domains_are_rejected_from_any_current_host() {
    assert_eq!(
        evaluate("https://hub.herime.com/cb", "other.example.com", &denied()),
        Err(RejectReason::DeniedHost)
    );
}

#[test]
fn valid_external_targets_are_approved_with_components_intact() {
    let url = evaluate(
        "https://partner.example:8443/cb?existing=1#frag",
        CURRENT_HOST,
        &denied(),
    )
    .unwrap();

    assert_eq!(url.scheme(), "https");
    assert_eq!(url.host_str(), Some("partner.example"));
    assert_eq!(url.port(), Some(8443));
    assert_eq!(url.path(), "/cb");
    assert_eq!(url.query(), Some("existing=1"));
    assert_eq!(url.fragment(), Some("frag"));
}

#[test]
fn single_and_double_encoded_targets_are_decoded() {
    let plain = "https://partner.example/cb?a=1";
    let once = urlencoding::encode(plain).into_owned();
    let twice = urlencoding::encode(&once).into_owned();

    for raw in [plain.to_string(), once, twice] {
        let url = evaluate(&raw, CURRENT_HOST, &denied()).unwrap();
        assert_eq!(url.as_str(), plain, "input {raw:?}");
    }
}

#[test]
fn decoding_does_not_bypass_the_same_domain_check() {
    let hidden = urlencoding::encode("https://compte.herime.com/steal").into_owned();
    assert_eq!(
        evaluate(&hidden, CURRENT_HOST, &denied()),
        Err(RejectReason::SameDomain)
    );

    let hidden_login =
        urlencoding::encode("https://academie.herime.com/login/phish").into_owned();
    assert_eq!(
        evaluate(&hidden_login, CURRENT_HOST, &denied()),
        Err(RejectReason::LoginPath)
    );
}

#[test]
fn decoding_is_bounded_to_five_iterations() {
    let mut encoded = "https://partner.example/cb".to_string();
    for _ in 0..7 {
        encoded = urlencoding::encode(&encoded).into_owned();
    }
    // Seven layers cannot be peeled within the bound, so no valid form is
    // ever reached and the input is rejected.
    assert!(evaluate(&encoded, CURRENT_HOST, &denied()).is_err());
}
