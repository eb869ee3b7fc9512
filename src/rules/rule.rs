//! Audit rules binding method selectors to directives.

use serde::{Deserialize, Serialize};

use crate::audit::LogType;

/// How much of a call is captured in its audit record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    #[default]
    Unspecified,
    /// Audit the call without request or response payloads.
    Audit,
    /// Audit the call with its request payload.
    AuditRequestOnly,
    /// Audit the call with both request and response payloads.
    AuditRequestAndResponse,
}

impl Directive {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Audit => "audit",
            Self::AuditRequestOnly => "audit_request_only",
            Self::AuditRequestAndResponse => "audit_request_and_response",
        }
    }

    /// Whether the request payload is captured.
    #[must_use]
    pub fn includes_request(&self) -> bool {
        matches!(self, Self::AuditRequestOnly | Self::AuditRequestAndResponse)
    }

    /// Whether the response payload is captured.
    #[must_use]
    pub fn includes_response(&self) -> bool {
        matches!(self, Self::AuditRequestAndResponse)
    }
}

/// Errors found when checking a rule.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule selector must not be empty")]
    EmptySelector,

    #[error("rule selector '{0}' may only contain '*' as its last character")]
    MisplacedWildcard(String),

    #[error("rule '{0}' has no directive")]
    MissingDirective(String),

    #[error("rule '{0}' has no log type")]
    MissingLogType(String),
}

/// A single audit rule.
///
/// The default value has an empty selector and stands for "no governing rule".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// `*`, a prefix wildcard such as `pkg.Service.*`, or an exact method name.
    pub selector: String,
    #[serde(default)]
    pub directive: Directive,
    #[serde(default)]
    pub log_type: LogType,
}

impl Rule {
    /// Create a new rule.
    #[must_use]
    pub fn new(selector: impl Into<String>, directive: Directive, log_type: LogType) -> Self {
        Self {
            selector: selector.into(),
            directive,
            log_type,
        }
    }

    /// Whether this is the zero rule returned when nothing matched.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.selector.is_empty()
    }

    /// Check that the rule is well formed.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.selector.is_empty() {
            return Err(RuleError::EmptySelector);
        }
        let body = self.selector.strip_suffix('*').unwrap_or(&self.selector);
        if body.contains('*') {
            return Err(RuleError::MisplacedWildcard(self.selector.clone()));
        }
        if self.directive == Directive::Unspecified {
            return Err(RuleError::MissingDirective(self.selector.clone()));
        }
        if self.log_type == LogType::Unspecified {
            return Err(RuleError::MissingLogType(self.selector.clone()));
        }
        Ok(())
    }
}
