//! Mutator adding configured default labels.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::audit::AuditRequest;
use crate::context::CallContext;
use crate::pipeline::{Processor, ProcessorError};

/// Adds default labels without overwriting labels already on the request.
#[derive(Debug, Clone, Default)]
pub struct LabelProcessor {
    labels: BTreeMap<String, String>,
}

impl LabelProcessor {
    #[must_use]
    pub fn new(labels: BTreeMap<String, String>) -> Self {
        Self { labels }
    }

    #[must_use]
    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }
}

#[async_trait]
impl Processor for LabelProcessor {
    fn name(&self) -> &str {
        "default_labels"
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
