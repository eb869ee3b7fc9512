//! Security context: who is making an intercepted call.
//!
//! # Components
//!
//! - [`FromRawJwt`]: Resolves the caller's email from a bearer JWT in call metadata
//! - [`TokenVerifier`]: Hook for checking a token before its claims are trusted
//!
//! Tokens are decoded, not verified, unless a [`TokenVerifier`] that enforces
//! signatures is supplied. No such verifier ships with this crate.

mod principal;
mod verifier;

pub use principal::*;
pub use verifier::*;
