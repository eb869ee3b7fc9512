//! Validator rejecting audit requests with missing identity fields.

use async_trait::async_trait;

use crate::audit::AuditRequest;
use crate::context::CallContext;
use crate::pipeline::{Processor, ProcessorError};

/// Ensures the payload names the method, the service and the principal.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidator;

impl RequestValidator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Processor for RequestValidator {
    fn name(&self) -> &str {
        "request_validator"
    }

    async fn process(
        &self,
        _ctx: &CallContext,
        request: &mut AuditRequest,
    ) -> Result<(), ProcessorError> {
        let payload = &request.payload;
        let required = [
            ("method_name", &payload.method_name),
            ("service_name", &payload.service_name),
            ("principal_email", &payload.principal_email),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(ProcessorError::InvalidArgument(format!(
                    "payload is missing {field}"
                )));
            }
        }
        Ok(())
    }
}
