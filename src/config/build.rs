//! Wiring of an [`AuditInterceptor`] from configuration.

use std::sync::Arc;

use crate::interceptor::AuditInterceptor;
use crate::pipeline::Client;
use crate::processors::{
    JsonLinesBackend, LabelProcessor, RequestValidator, RuntimeInfoProcessor, TracingBackend,
};
use crate::security::FromRawJwt;

use super::{AuditConfig, BackendConfig, ConfigError};

/// Build the audit client described by `config`.
///
/// Validators run the request validator, then the principal filter when
/// conditions are set. Mutators add default labels, then runtime labels.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the backend cannot be opened.
pub async fn build_client(config: &AuditConfig) -> Result<Client, ConfigError> {
    config.validate()?;

    let mut builder = Client::builder()
        .default_mode(config.log_mode)
        .validator(Arc::new(RequestValidator::new()));

    let filter = config.condition.principal_filter()?;
    if !filter.is_empty() {
        builder = builder.validator(Arc::new(filter));
    }

    if !config.labels.is_empty() {
        builder = builder.mutator(Arc::new(LabelProcessor::new(config.labels.clone())));
    }
    if config.runtime_info {
        builder = builder.mutator(Arc::new(RuntimeInfoProcessor::from_env()));
    }

    builder = match &config.backend {
        BackendConfig::Stdout => builder.stoppable_backend(Arc::new(JsonLinesBackend::stdout())),
        BackendConfig::File { path } => {
            let backend = JsonLinesBackend::open(path)
                .await
                .map_err(|e| ConfigError::Invalid(format!("backend: {e}")))?;
            builder.stoppable_backend(Arc::new(backend))
        }
        BackendConfig::Tracing => builder.backend(Arc::new(TracingBackend)),
    };

    let client = builder.build();
    tracing::info!(
        mode = config.log_mode.as_str(),
        rules = config.rules.len(),
        client = ?client,
        "Audit client ready"
    );
    Ok(client)
}

/// Build an interceptor with the principal extractor, rules and client from `config`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the backend cannot be opened.
pub async fn build_interceptor(config: &AuditConfig) -> Result<AuditInterceptor, ConfigError> {
    let client = build_client(config).await?;
    let principal = FromRawJwt::new(config.security_context.from_raw_jwt.clone());
    Ok(AuditInterceptor::new(
        principal,
        config.rules.clone(),
        Arc::new(client),
    ))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::audit::{LogMode, LogType};
    use crate::rules::{Directive, Rule};

    fn config(backend: BackendConfig) -> AuditConfig {
        AuditConfig {
            log_mode: LogMode::FailClose,
            rules: vec![Rule::new("*", Directive::Audit, LogType::DataAccess)],
            runtime_info: false,
            backend,
            ..AuditConfig::default()
        }
    }

    #[tokio::test]
    async fn test_build_client_uses_config_mode() {
        let client = build_client(&config(BackendConfig::Tracing)).await.unwrap();
        assert_eq!(client.default_mode(), LogMode::FailClose);
        let debug = format!("{client:?}");
        assert!(debug.contains("request_validator"));
        assert!(debug.contains("tracing"));
        assert!(!debug.contains("principal_filter"));
    }

    #[tokio::test]
    async fn test_build_client_with_filter_and_labels() {
        let mut config = config(BackendConfig::Tracing);
        config.condition.principal_exclude = Some("^bot-".to_string());
        config.labels.insert("env".to_string(), "prod".to_string());

        let debug = format!("{:?}", build_client(&config).await.unwrap());
        assert!(debug.contains("principal_filter"));
        assert!(debug.contains("default_labels"));
    }

    #[tokio::test]
    async fn test_build_interceptor_with_file_backend() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("audit.jsonl");

        let interceptor = build_interceptor(&config(BackendConfig::File { path: path.clone() }))
            .await
            .unwrap();
        assert_eq!(interceptor.rules().len(), 1);
        assert!(path.exists());
        interceptor.client().stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_config() {
        let mut config = config(BackendConfig::Tracing);
        config.rules.clear();
        assert!(build_interceptor(&config).await.is_err());
    }
}
