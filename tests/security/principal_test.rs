//! Integration tests for principal extraction.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::json;

use audit_logging::context::{CallContext, Metadata};
use audit_logging::security::{FromRawJwt, JwtSource, PrincipalError};

fn jwt(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

fn extractor() -> FromRawJwt {
    FromRawJwt::new(vec![JwtSource::new("authorization", "Bearer ")])
}

#[test]
fn bearer_token_yields_email() {
    let token = jwt(&json!({ "email": "user@example.com", "sub": "42" }));
    let metadata: Metadata = [("authorization", format!("Bearer {token}"))]
        .into_iter()
        .collect();

    let principal = extractor()
        .request_principal(&CallContext::with_metadata(metadata))
        .expect("Should extract principal");
    assert_eq!(principal, "user@example.com");
}

#[test]
fn missing_key_is_no_matching_credential() {
    let metadata: Metadata = [("x-request-id", "abc")].into_iter().collect();

    let err = extractor()
        .request_principal(&CallContext::with_metadata(metadata))
        .unwrap_err();
    assert_eq!(err, PrincipalError::NoMatchingCredential);
}

#[test]
fn list_email_claim_is_invalid_claim_type() {
    let token = jwt(&json!({ "email": ["user@example.com"] }));
    let metadata: Metadata = [("authorization", format!("Bearer {token}"))]
        .into_iter()
        .collect();

    let err = extractor()
        .request_principal(&CallContext::with_metadata(metadata))
        .unwrap_err();
    assert!(matches!(err, PrincipalError::InvalidClaimType(_)));
}

#[test]
fn sources_are_tried_in_order() {
    let first = jwt(&json!({ "email": "first@example.com" }));
    let second = jwt(&json!({ "email": "second@example.com" }));
    let extractor = FromRawJwt::new(vec![
        JwtSource::new("x-goog-iap-jwt-assertion", ""),
        JwtSource::new("authorization", "Bearer "),
    ]);
    let metadata: Metadata = [
        ("authorization", format!("Bearer {second}")),
        ("x-goog-iap-jwt-assertion", first),
    ]
    .into_iter()
    .collect();

    let principal = extractor
        .request_principal(&CallContext::with_metadata(metadata))
        .unwrap();
    assert_eq!(principal, "first@example.com");
}

#[test]
fn non_object_claims_are_malformed() {
    let header = URL_SAFE_NO_PAD.encode("{}");
    let payload = URL_SAFE_NO_PAD.encode("[1,2,3]");
    let metadata: Metadata = [("authorization", format!("Bearer {header}.{payload}.sig"))]
        .into_iter()
        .collect();

    let err = extractor()
        .request_principal(&CallContext::with_metadata(metadata))
        .unwrap_err();
    assert!(matches!(err, PrincipalError::MalformedToken(_)));
}
