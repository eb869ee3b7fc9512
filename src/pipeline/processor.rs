//! The contract implemented by every pipeline processor.

use async_trait::async_trait;

use crate::audit::AuditRequest;
use crate::context::CallContext;

/// Errors returned by processors.
///
/// [`ProcessorError::PreconditionFailed`] is not a failure: it tells the
/// pipeline to drop the request without auditing it. Every other variant is a
/// processing failure handled according to the request's log mode.
#[derive(thiserror::Error, Debug)]
pub enum ProcessorError {
    /// The request must not be audited.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// The request is missing data the processor requires.
    #[error("invalid audit request: {0}")]
    InvalidArgument(String),

    /// The caller cancelled the call while it was being processed.
    #[error("audit processing cancelled")]
    Cancelled,

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize audit request: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A backend could not deliver the request.
    #[error("backend failure: {0}")]
    Backend(String),
}

impl ProcessorError {
    /// Whether this error asks for the request to be dropped rather than failed.
    #[must_use]
    pub fn is_precondition_failure(&self) -> bool {
        matches!(self, Self::PreconditionFailed(_))
    }
}

/// A step of the audit pipeline.
///
/// Processors are shared across concurrent calls and must not keep per-call
/// state; everything a call needs lives in the [`AuditRequest`].
#[async_trait]
pub trait Processor: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Inspect or rewrite the request, or deliver it.
    async fn process(
        &self,
        ctx: &CallContext,
        request: &mut AuditRequest,
    ) -> Result<(), ProcessorError>;
}

/// Processors holding buffered state that must be flushed at shutdown.
#[async_trait]
pub trait Stoppable: Send + Sync {
    /// Flush and release resources.
    async fn stop(&self) -> Result<(), ProcessorError>;
}
