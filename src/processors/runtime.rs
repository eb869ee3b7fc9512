//! Mutator tagging requests with the runtime environment of the server.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::audit::AuditRequest;
use crate::context::CallContext;
use crate::pipeline::{Processor, ProcessorError};

/// Label holding the detected platform.
pub const RUNTIME_PLATFORM_LABEL: &str = "runtime_platform";

/// Platform the server is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    CloudRun,
    Kubernetes,
    Unknown,
}

impl Platform {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CloudRun => "cloud_run",
            Self::Kubernetes => "kubernetes",
            Self::Unknown => "unknown",
        }
    }
}

/// Adds `runtime_*` labels describing where the server runs.
///
/// The environment is inspected once, at construction.
#[derive(Debug, Clone)]
pub struct RuntimeInfoProcessor {
    platform: Platform,
    labels: BTreeMap<String, String>,
}

impl RuntimeInfoProcessor {
    /// Detect the runtime from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::detect(|key| std::env::var(key).ok())
    }

    /// Detect the runtime using `lookup` to read environment variables.
    pub fn detect<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut labels = BTreeMap::new();
        let mut collect = |label: &str, var: &str| {
            if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
                labels.insert(format!("runtime_{label}"), value);
            }
        };

        let platform = if lookup("K_SERVICE").is_some() {
            collect("service", "K_SERVICE");
            collect("revision", "K_REVISION");
            collect("configuration", "K_CONFIGURATION");
            Platform::CloudRun
        } else if lookup("KUBERNETES_SERVICE_HOST").is_some() {
            collect("pod", "POD_NAME");
            collect("namespace", "POD_NAMESPACE");
            Platform::Kubernetes
        } else {
            Platform::Unknown
        };

        labels.insert(
            RUNTIME_PLATFORM_LABEL.to_string(),
            platform.as_str().to_string(),
        );
        tracing::debug!(platform = platform.as_str(), "Detected runtime platform");

        Self { platform, labels }
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }
}

#[async_trait]
impl Processor for RuntimeInfoProcessor {
    fn name(&self) -> &str {
        "runtime_info"
    }

    async fn process(
        &self,
        _ctx: &CallContext,
        request: &mut AuditRequest,
    ) -> Result<(), ProcessorError> {
        for (key, value) in &self.labels {
            request
                .labels
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        Ok(())
    }
}
