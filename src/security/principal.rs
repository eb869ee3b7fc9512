//! Principal extraction from bearer JWTs in call metadata.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::context::CallContext;

use super::verifier::{NoVerification, TokenVerifier};

/// Claim holding the principal's email.
const EMAIL_CLAIM: &str = "email";

/// Errors that can occur while resolving the calling principal.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PrincipalError {
    #[error("call carries no metadata")]
    MissingMetadata,

    #[error("no matching credential found in call metadata")]
    NoMatchingCredential,

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("token is missing the '{0}' claim")]
    MissingClaim(String),

    #[error("invalid claim type: '{0}' is not a string")]
    InvalidClaimType(String),

    #[error("token rejected: {0}")]
    Rejected(String),
}

/// A metadata location where a bearer JWT may be found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtSource {
    /// Metadata key, matched case-insensitively.
    pub key: String,
    /// Prefix stripped from the value, matched case-insensitively.
    #[serde(default)]
    pub prefix: String,
}

impl JwtSource {
    #[must_use]
    pub fn new(key: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            prefix: prefix.into(),
        }
    }

    /// Strip this source's prefix from `value`, if it is present.
    fn strip<'a>(&self, value: &'a str) -> Option<&'a str> {
        let head = value.get(..self.prefix.len())?;
        if head.eq_ignore_ascii_case(&self.prefix) {
            value.get(self.prefix.len()..)
        } else {
            None
        }
    }
}

/// Resolves the calling principal from a raw JWT carried in metadata.
///
/// Only the token's claims are decoded. Signatures are checked by the
/// configured [`TokenVerifier`], which defaults to [`NoVerification`].
#[derive(Debug, Clone)]
pub struct FromRawJwt {
    sources: Vec<JwtSource>,
    verifier: Arc<dyn TokenVerifier>,
}

impl FromRawJwt {
    /// Create an extractor trying `sources` in order.
    #[must_use]
    pub fn new(sources: Vec<JwtSource>) -> Self {
        Self::with_verifier(sources, Arc::new(NoVerification))
    }

    /// Create an extractor with an explicit token verifier.
    #[must_use]
    pub fn with_verifier(sources: Vec<JwtSource>, verifier: Arc<dyn TokenVerifier>) -> Self {
        if !verifier.is_enforcing() {
            tracing::warn!(
                "JWT signatures are not verified; principal claims are trusted as presented"
            );
        }
        Self { sources, verifier }
    }

    #[must_use]
    pub fn sources(&self) -> &[JwtSource] {
        &self.sources
    }

    /// Resolve the email of the principal making the call.
    ///
    /// # Errors
    ///
    /// Returns a [`PrincipalError`] if no credential is present, the token
    /// cannot be decoded, or its `email` claim is absent or not a string.
    pub fn request_principal(&self, ctx: &CallContext) -> Result<String, PrincipalError> {
        let metadata = ctx.metadata().ok_or(PrincipalError::MissingMetadata)?;

        let token = self
            .sources
            .iter()
            .find_map(|source| {
                metadata
                    .get(&source.key)
                    .and_then(|value| source.strip(value))
                    .filter(|candidate| !candidate.is_empty())
            })
            .ok_or(PrincipalError::NoMatchingCredential)?;

        self.verifier.verify(token)?;
        let claims = decode_claims(token)?;

        match claims.get(EMAIL_CLAIM) {
            None => Err(PrincipalError::MissingClaim(EMAIL_CLAIM.to_string())),
            Some(serde_json::Value::String(email)) => Ok(email.clone()),
            Some(_) => Err(PrincipalError::InvalidClaimType(EMAIL_CLAIM.to_string())),
        }
    }
}

/// Decode a JWT's claims without checking its signature.
fn decode_claims(token: &str) -> Result<serde_json::Map<String, serde_json::Value>, PrincipalError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(PrincipalError::MalformedToken(
            "token must have 3 parts".to_string(),
        ));
    }

    let decoded = URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|e| PrincipalError::MalformedToken(format!("failed to decode payload: {e}")))?;

    serde_json::from_slice(&decoded)
        .map_err(|e| PrincipalError::MalformedToken(format!("failed to parse claims: {e}")))
}
