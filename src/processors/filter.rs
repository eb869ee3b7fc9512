//! Regex filter deciding which principals are audited.

use async_trait::async_trait;
use regex::Regex;

use crate::audit::AuditRequest;
use crate::context::CallContext;
use crate::pipeline::{Processor, ProcessorError};

/// Error type for principal filter construction.
#[derive(thiserror::Error, Debug)]
pub enum FilterError {
    /// Invalid regex pattern.
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Drops requests from principals that are excluded or not included.
///
/// Exclusion wins over inclusion. Without an include pattern every principal
/// not excluded is audited.
#[derive(Debug, Clone, Default)]
pub struct PrincipalFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl PrincipalFilter {
    /// Create a filter from optional include and exclude patterns.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidPattern` if either regex is invalid.
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self, FilterError> {
        Ok(Self {
            include: include.map(Regex::new).transpose()?,
            exclude: exclude.map(Regex::new).transpose()?,
        })
    }

    /// Check whether the principal should be audited.
    #[must_use]
    pub fn allows(&self, principal: &str) -> bool {
        if self.exclude.as_ref().is_some_and(|re| re.is_match(principal)) {
            return false;
        }
        self.include.as_ref().map_or(true, |re| re.is_match(principal))
    }

    /// Whether any pattern is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }
}

#[async_trait]
impl Processor for PrincipalFilter {
    fn name(&self) -> &str {
        "principal_filter"
    }

    async fn process(
        &self,
        _ctx: &CallContext,
        request: &mut AuditRequest,
    ) -> Result<(), ProcessorError> {
        let principal = &request.payload.principal_email;
        if self.allows(principal) {
            return Ok(());
        }
        tracing::debug!(principal = %principal, "Principal excluded from audit logging");
        Err(ProcessorError::PreconditionFailed(
            "principal is excluded from audit logging".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_allows_everyone() {
        let filter = PrincipalFilter::default();
        assert!(filter.is_empty());
        assert!(filter.allows("anyone@example.com"));
    }

    #[test]
    fn test_exclude_pattern() {
        let filter = PrincipalFilter::new(None, Some(r"@robot\.example\.com$")).unwrap();
        assert!(!filter.allows("ci@robot.example.com"));
        assert!(filter.allows("user@example.com"));
    }

    #[test]
    fn test_include_pattern() {
        let filter = PrincipalFilter::new(Some(r"@example\.com$"), None).unwrap();
        assert!(filter.allows("user@example.com"));
        assert!(!filter.allows("user@other.org"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let filter =
            PrincipalFilter::new(Some(r"@example\.com$"), Some(r"^bot-")).unwrap();
        assert!(!filter.allows("bot-1@example.com"));
        assert!(filter.allows("alice@example.com"));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = PrincipalFilter::new(Some("[unclosed"), None);
        assert!(matches!(result, Err(FilterError::InvalidPattern(_))));
    }

    #[tokio::test]
    async fn test_excluded_principal_is_precondition_failure() {
        let filter = PrincipalFilter::new(None, Some(r"^bot-")).unwrap();
        let mut request = AuditRequest::builder("pkg.Service.Get")
            .principal_email("bot-7@example.com")
            .build();

        let err = filter
            .process(&CallContext::new(), &mut request)
            .await
            .unwrap_err();
        assert!(err.is_precondition_failure());
        assert!(!err.to_string().contains("bot-7@example.com"));
    }
}
