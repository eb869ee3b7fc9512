//! Backends delivering audit requests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

use crate::audit::AuditRequest;
use crate::context::CallContext;
use crate::pipeline::{Processor, ProcessorError, Stoppable};

type Sink = Box<dyn AsyncWrite + Send + Unpin>;

/// Writes each audit request as one JSON line.
///
/// Every line is flushed before `process` returns, so a failed write is
/// reported for the request that caused it. [`Stoppable::stop`] flushes once
/// more on shutdown.
pub struct JsonLinesBackend {
    name: String,
    writer: Mutex<BufWriter<Sink>>,
    path: Option<PathBuf>,
}

impl JsonLinesBackend {
    /// Create a backend writing to an arbitrary async writer.
    pub fn new(name: impl Into<String>, writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        let sink: Sink = Box::new(writer);
        Self {
            name: name.into(),
            writer: Mutex::new(BufWriter::new(sink)),
            path: None,
        }
    }

    /// Create a backend writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new("stdout", tokio::io::stdout())
    }

    /// Open a file in append mode, creating it and its parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ProcessorError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        tracing::debug!(path = %path.display(), "Opened audit log file");

        let mut backend = Self::new("file", file);
        backend.path = Some(path);
        Ok(backend)
    }

    /// Get the file path, if this backend writes to a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl std::fmt::Debug for JsonLinesBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesBackend")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Processor for JsonLinesBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(
        &self,
        _ctx: &CallContext,
        request: &mut AuditRequest,
    ) -> Result<(), ProcessorError> {
        let mut line = serde_json::to_vec(&*request)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl Stoppable for JsonLinesBackend {
    async fn stop(&self) -> Result<(), ProcessorError> {
        let mut writer = self.writer.lock().await;
        writer.flush().await?;
        tracing::debug!(backend = %self.name, "Flushed audit log");
        Ok(())
    }
}

/// Emits each audit request as a `tracing` event on the `audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBackend;

#[async_trait]
impl Processor for TracingBackend {
    fn name(&self) -> &str {
        "tracing"
    }

    async fn process(
        &self,
        _ctx: &CallContext,
        request: &mut AuditRequest,
    ) -> Result<(), ProcessorError> {
        let entry = serde_json::to_string(&*request)?;
        tracing::info!(
            target: "audit",
            method = %request.payload.method_name,
            principal = %request.payload.principal_email,
            log_type = request.log_type.as_str(),
            entry = %entry,
            "Audit log entry"
        );
        Ok(())
    }
}
