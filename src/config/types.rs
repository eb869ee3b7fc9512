//! Configuration types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::audit::LogMode;
use crate::processors::PrincipalFilter;
use crate::rules::Rule;
use crate::security::JwtSource;

use super::ConfigError;

/// Where audit requests are delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// JSON lines on standard output.
    Stdout,
    /// JSON lines appended to a file.
    File { path: PathBuf },
    /// Events on the `audit` tracing target.
    Tracing,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Stdout
    }
}

/// How the calling principal is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityContextConfig {
    /// Metadata locations checked in order for a bearer JWT.
    pub from_raw_jwt: Vec<JwtSource>,
}

impl Default for SecurityContextConfig {
    fn default() -> Self {
        Self {
            from_raw_jwt: vec![JwtSource::new("authorization", "Bearer ")],
        }
    }
}

/// Regex conditions on which principals are audited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionConfig {
    /// Only principals matching this pattern are audited.
    pub principal_include: Option<String>,
    /// Principals matching this pattern are never audited.
    pub principal_exclude: Option<String>,
}

impl ConditionConfig {
    /// Build the principal filter for these conditions.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a pattern does not compile.
    pub fn principal_filter(&self) -> Result<PrincipalFilter, ConfigError> {
        PrincipalFilter::new(
            self.principal_include.as_deref(),
            self.principal_exclude.as_deref(),
        )
        .map_err(|e| ConfigError::Invalid(format!("condition: {e}")))
    }
}

/// Audit logging configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Mode applied to requests that do not set one.
    pub log_mode: LogMode,
    /// Audit rules; the most specific selector governs each method.
    pub rules: Vec<Rule>,
    /// Principal resolution settings.
    pub security_context: SecurityContextConfig,
    /// Principal filter conditions.
    pub condition: ConditionConfig,
    /// Labels added to every audit request.
    pub labels: BTreeMap<String, String>,
    /// Tag requests with the runtime platform.
    pub runtime_info: bool,
    /// Delivery backend.
    pub backend: BackendConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_mode: LogMode::BestEffort,
            rules: Vec::new(),
            security_context: SecurityContextConfig::default(),
            condition: ConditionConfig::default(),
            labels: BTreeMap::new(),
            runtime_info: true,
            backend: BackendConfig::default(),
        }
    }
}

impl AuditConfig {
    /// Check the configuration before it is handed to the interceptor.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_mode == LogMode::Unspecified {
            return Err(ConfigError::Invalid(
                "log_mode must be fail_close or best_effort".to_string(),
            ));
        }
        if self.rules.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one rule is required".to_string(),
            ));
        }
        for rule in &self.rules {
            rule.validate()
                .map_err(|e| ConfigError::Invalid(format!("rules: {e}")))?;
        }

        let sources = &self.security_context.from_raw_jwt;
        if sources.is_empty() {
            return Err(ConfigError::Invalid(
                "security_context.from_raw_jwt must list at least one source".to_string(),
            ));
        }
        if sources.iter().any(|s| s.key.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "security_context.from_raw_jwt keys must not be empty".to_string(),
            ));
        }

        self.condition.principal_filter()?;

        if let BackendConfig::File { path } = &self.backend {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "backend.path must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
