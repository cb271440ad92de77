//! Property-based tests for bearer credential extraction.

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue};
use proptest::prelude::*;
use url_shortener::credential::BEARER_PREFIX;
use url_shortener::{Credential, CredentialError};

fn arb_token() -> impl Strategy<Value = String> {
    "[A-Za-z0-9._~+/=-]{1,64}"
}

fn arb_header_value() -> impl Strategy<Value = String> {
    "[ -~]{0,40}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Two or more Authorization values are always ambiguous, however valid
    /// each one is on its own.
    #[test]
    fn prop_multiple_values_rejected(tokens in prop::collection::vec(arb_token(), 2..5)) {
        let mut headers = HeaderMap::new();
        for token in &tokens {
            headers.append(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("{BEARER_PREFIX}{token}")).unwrap(),
            );
        }
        prop_assert_eq!(Credential::from_headers(&headers), Err(CredentialError::AmbiguousHeader));
    }

    /// Values without the exact "Bearer " prefix never yield a credential.
    #[test]
    fn prop_missing_prefix_rejected(value in arb_header_value()) {
        prop_assume!(!value.starts_with(BEARER_PREFIX));
        prop_assert_eq!(Credential::parse(&value), Err(CredentialError::MalformedScheme));
    }

    /// Well-formed values yield the token, and forwarding re-attaches the
    /// prefix exactly once.
    #[test]
    fn prop_single_value_accepted(token in arb_token()) {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("{BEARER_PREFIX}{token}")).unwrap(),
        );
        let credential = Credential::from_headers(&headers).unwrap();
        prop_assert_eq!(credential.token(), token.as_str());
        prop_assert_eq!(credential.header_value(), format!("{BEARER_PREFIX}{token}"));
    }

    /// Unrelated headers never stand in for Authorization.
    #[test]
    fn prop_absent_header_rejected(name in "x-[a-z]{1,12}", value in arb_token()) {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(&value).unwrap(),
        );
        prop_assert_eq!(Credential::from_headers(&headers), Err(CredentialError::MissingHeader));
    }
}
