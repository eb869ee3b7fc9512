//! The audit client running requests through validators, mutators and backends.

use std::fmt;
use std::sync::Arc;

use crate::audit::{AuditRequest, LogMode};
use crate::context::CallContext;

use super::processor::{Processor, ProcessorError, Stoppable};

/// Pipeline stage a processor is registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validator,
    Mutator,
    Backend,
}

impl Stage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validator => "validator",
            Self::Mutator => "mutator",
            Self::Backend => "backend",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A processor that failed to stop.
#[derive(Debug)]
pub struct StopFailure {
    pub processor: String,
    pub source: ProcessorError,
}

impl fmt::Display for StopFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.processor, self.source)
    }
}

/// Errors returned by the audit client.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A processor failed while the request was in fail-close mode.
    #[error("{stage} '{processor}' failed: {source}")]
    ProcessingFailed {
        stage: Stage,
        processor: String,
        #[source]
        source: ProcessorError,
    },

    /// One or more processors failed to flush at shutdown.
    #[error("failed to stop {} processor(s): {}", .failures.len(), join_failures(.failures))]
    StopFailed { failures: Vec<StopFailure> },
}

fn join_failures(failures: &[StopFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A processor together with its stop capability, resolved at registration.
#[derive(Clone)]
struct Registered {
    processor: Arc<dyn Processor>,
    stopper: Option<Arc<dyn Stoppable>>,
}

impl Registered {
    fn plain(processor: Arc<dyn Processor>) -> Self {
        Self {
            processor,
            stopper: None,
        }
    }

    fn stoppable<P>(processor: Arc<P>) -> Self
    where
        P: Processor + Stoppable + 'static,
    {
        Self {
            processor: processor.clone(),
            stopper: Some(processor),
        }
    }
}

/// Builder for [`Client`].
#[derive(Clone)]
pub struct ClientBuilder {
    validators: Vec<Registered>,
    mutators: Vec<Registered>,
    backends: Vec<Registered>,
    default_mode: LogMode,
}

impl ClientBuilder {
    /// Create a builder with no processors and a best-effort default mode.
    #[must_use]
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
            mutators: Vec::new(),
            backends: Vec::new(),
            default_mode: LogMode::BestEffort,
        }
    }

    /// Mode applied to requests that arrive with [`LogMode::Unspecified`].
    #[must_use]
    pub fn default_mode(mut self, mode: LogMode) -> Self {
        self.default_mode = mode;
        self
    }

    #[must_use]
    pub fn validator(mut self, processor: Arc<dyn Processor>) -> Self {
        self.validators.push(Registered::plain(processor));
        self
    }

    /// Add a validator that is also stopped by [`Client::stop`].
    #[must_use]
    pub fn stoppable_validator<P>(mut self, processor: Arc<P>) -> Self
    where
        P: Processor + Stoppable + 'static,
    {
        self.validators.push(Registered::stoppable(processor));
        self
    }

    /// Add a mutator. Mutators are never stopped.
    #[must_use]
    pub fn mutator(mut self, processor: Arc<dyn Processor>) -> Self {
        self.mutators.push(Registered::plain(processor));
        self
    }

    #[must_use]
    pub fn backend(mut self, processor: Arc<dyn Processor>) -> Self {
        self.backends.push(Registered::plain(processor));
        self
    }

    /// Add a backend that is also stopped by [`Client::stop`].
    #[must_use]
    pub fn stoppable_backend<P>(mut self, processor: Arc<P>) -> Self
    where
        P: Processor + Stoppable + 'static,
    {
        self.backends.push(Registered::stoppable(processor));
        self
    }

    #[must_use]
    pub fn build(self) -> Client {
        Client {
            validators: self.validators,
            mutators: self.mutators,
            backends: self.backends,
            default_mode: self.default_mode,
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs audit requests through the configured processors.
///
/// The client is immutable once built and is meant to be shared, e.g. as
/// `Arc<Client>`, across concurrent calls.
pub struct Client {
    validators: Vec<Registered>,
    mutators: Vec<Registered>,
    backends: Vec<Registered>,
    default_mode: LogMode,
}

impl Client {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    #[must_use]
    pub fn default_mode(&self) -> LogMode {
        self.default_mode
    }

    fn stages(&self) -> [(Stage, &[Registered]); 3] {
        [
            (Stage::Validator, self.validators.as_slice()),
            (Stage::Mutator, self.mutators.as_slice()),
            (Stage::Backend, self.backends.as_slice()),
        ]
    }

    /// Run the request through validators, mutators and backends, in order.
    ///
    /// A precondition failure drops the request silently. Any other processor
    /// error stops processing and is returned only when the request's mode is
    /// [`LogMode::FailClose`]; otherwise it is logged and swallowed.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ProcessingFailed`] for a processor failure in
    /// fail-close mode.
    pub async fn log(
        &self,
        ctx: &CallContext,
        request: &mut AuditRequest,
    ) -> Result<(), PipelineError> {
        if request.mode == LogMode::Unspecified {
            request.mode = self.default_mode;
        }

        for (stage, processors) in self.stages() {
            for entry in processors {
                let name = entry.processor.name();
                let result = if ctx.is_cancelled() {
                    Err(ProcessorError::Cancelled)
                } else {
                    entry.processor.process(ctx, request).await
                };

                let Err(error) = result else {
                    tracing::trace!(stage = %stage, processor = %name, "Processor succeeded");
                    continue;
                };

                if error.is_precondition_failure() {
                    tracing::warn!(
                        stage = %stage,
                        processor = %name,
                        method = %request.payload.method_name,
                        reason = %error,
                        "Audit request dropped"
                    );
                    return Ok(());
                }

                if request.mode.is_fail_close() {
                    return Err(PipelineError::ProcessingFailed {
                        stage,
                        processor: name.to_string(),
                        source: error,
                    });
                }

                tracing::error!(
                    stage = %stage,
                    processor = %name,
                    method = %request.payload.method_name,
                    mode = request.mode.as_str(),
                    error = %error,
                    "Audit logging failed, continuing best effort"
                );
                return Ok(());
            }
        }

        tracing::debug!(method = %request.payload.method_name, "Audit request processed");
        Ok(())
    }

    /// Stop every stoppable validator and backend.
    ///
    /// All processors are stopped even if some fail.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::StopFailed`] listing every processor that failed.
    pub async fn stop(&self) -> Result<(), PipelineError> {
        let mut failures = Vec::new();

        for entry in self.validators.iter().chain(&self.backends) {
            let Some(stopper) = &entry.stopper else {
                continue;
            };
            let name = entry.processor.name();
            if let Err(source) = stopper.stop().await {
                tracing::error!(processor = %name, error = %source, "Failed to stop processor");
                failures.push(StopFailure {
                    processor: name.to_string(),
                    source,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::StopFailed { failures })
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |entries: &[Registered]| -> Vec<String> {
            entries
                .iter()
                .map(|e| e.processor.name().to_string())
                .collect()
        };
        f.debug_struct("Client")
            .field("validators", &names(&self.validators))
            .field("mutators", &names(&self.mutators))
            .field("backends", &names(&self.backends))
            .field("default_mode", &self.default_mode)
            .finish()
    }
}
