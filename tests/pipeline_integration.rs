//! Integration tests for the audit processing pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use audit_logging::audit::{AuditRequest, LogMode, LogType};
use audit_logging::context::CallContext;
use audit_logging::pipeline::{Client, PipelineError, Processor, ProcessorError, Stage};
use audit_logging::processors::{LabelProcessor, PrincipalFilter, RequestValidator};

/// Appends its name to the `trace` label and counts invocations.
struct Step {
    name: &'static str,
    calls: AtomicUsize,
    outcome: Option<fn() -> ProcessorError>,
}

impl Step {
    fn ok(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls: AtomicUsize::new(0),
            outcome: None,
        })
    }

    fn failing(name: &'static str, error: fn() -> ProcessorError) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls: AtomicUsize::new(0),
            outcome: Some(error),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Processor for Step {
    fn name(&self) -> &str {
        self.name
    }

    async fn process(
        &self,
        _ctx: &CallContext,
        request: &mut AuditRequest,
    ) -> Result<(), ProcessorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.outcome {
            return Err(error());
        }
        request
            .labels
            .entry("trace".to_string())
            .or_default()
            .push_str(&format!("{}, ", self.name));
        Ok(())
    }
}

fn request() -> AuditRequest {
    AuditRequest::builder("pkg.Service.Get")
        .service_name("pkg.Service")
        .principal_email("user@example.com")
        .log_type(LogType::DataAccess)
        .timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        .build()
}

#[tokio::test]
async fn test_processors_run_in_stage_and_registration_order() {
    let client = Client::builder()
        .validator(Step::ok("V1"))
        .validator(Step::ok("V2"))
        .mutator(Step::ok("M1"))
        .backend(Step::ok("B1"))
        .backend(Step::ok("B2"))
        .build();

    let mut req = request();
    client.log(&CallContext::new(), &mut req).await.unwrap();
    assert_eq!(req.labels["trace"], "V1, V2, M1, B1, B2, ");
}

#[tokio::test]
async fn test_precondition_failure_skips_backends() {
    let b1 = Step::ok("B1");
    let b2 = Step::ok("B2");
    let client = Client::builder()
        .validator(Step::ok("V1"))
        .validator(Step::failing("V2", || {
            ProcessorError::PreconditionFailed("principal excluded".to_string())
        }))
        .mutator(Step::ok("M1"))
        .backend(b1.clone())
        .backend(b2.clone())
        .build();

    let mut req = request();
    req.mode = LogMode::FailClose;
    assert!(client.log(&CallContext::new(), &mut req).await.is_ok());
    assert_eq!(b1.calls(), 0);
    assert_eq!(b2.calls(), 0);
}

#[tokio::test]
async fn test_backend_error_follows_mode() {
    let client = Client::builder()
        .backend(Step::failing("B1", || {
            ProcessorError::Backend("write rejected".to_string())
        }))
        .build();

    let mut fail_close = request();
    fail_close.mode = LogMode::FailClose;
    let err = client
        .log(&CallContext::new(), &mut fail_close)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::ProcessingFailed {
            stage: Stage::Backend,
            ..
        }
    ));
    assert!(err.to_string().contains("write rejected"));

    let mut best_effort = request();
    best_effort.mode = LogMode::BestEffort;
    assert!(client
        .log(&CallContext::new(), &mut best_effort)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_validation_failure_is_processing_failure() {
    let backend = Step::ok("B1");
    let client = Client::builder()
        .default_mode(LogMode::FailClose)
        .validator(Arc::new(RequestValidator::new()))
        .backend(backend.clone())
        .build();

    let mut req = AuditRequest::builder("pkg.Service.Get")
        .service_name("pkg.Service")
        .build();
    let err = client.log(&CallContext::new(), &mut req).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::ProcessingFailed {
            stage: Stage::Validator,
            source: ProcessorError::InvalidArgument(_),
            ..
        }
    ));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_principal_filter_drops_request() {
    let backend = Step::ok("B1");
    let client = Client::builder()
        .default_mode(LogMode::FailClose)
        .validator(Arc::new(
            PrincipalFilter::new(None, Some(r"@example\.com$")).unwrap(),
        ))
        .backend(backend.clone())
        .build();

    let mut req = request();
    client.log(&CallContext::new(), &mut req).await.unwrap();
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_processing_is_idempotent() {
    let labels = [("env".to_string(), "prod".to_string())].into_iter().collect();
    let client = Client::builder()
        .validator(Arc::new(RequestValidator::new()))
        .mutator(Arc::new(LabelProcessor::new(labels)))
        .build();

    let original = request();
    let mut first = original.clone();
    let mut second = original.clone();
    client.log(&CallContext::new(), &mut first).await.unwrap();
    client.log(&CallContext::new(), &mut second).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.labels["env"], "prod");
    assert_eq!(first.mode, LogMode::BestEffort);
}

#[tokio::test]
async fn test_shared_client_handles_concurrent_calls() {
    let backend = Step::ok("B1");
    let client = Arc::new(
        Client::builder()
            .validator(Arc::new(RequestValidator::new()))
            .backend(backend.clone())
            .build(),
    );

    let mut handles = Vec::new();
    for i in 0..16 {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(async move {
            let mut req = AuditRequest::builder(format!("pkg.Service.Call{i}"))
                .service_name("pkg.Service")
                .principal_email("user@example.com")
                .build();
            client.log(&CallContext::new(), &mut req).await.unwrap();
            req
        }));
    }

    for handle in handles {
        let req = handle.await.unwrap();
        assert_eq!(req.labels["trace"], "B1, ");
    }
    assert_eq!(backend.calls(), 16);
}
