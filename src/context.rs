//! Per-call context handed to the principal extractor and to processors.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

/// Inbound call metadata with case-insensitive keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: HashMap<String, String>,
}

impl Metadata {
    /// Create empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. Keys are stored lowercased; a later insert replaces an earlier one.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .insert(key.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Look up a value by key, ignoring ASCII case.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Self::new();
        for (key, value) in iter {
            metadata.insert(key, value);
        }
        metadata
    }
}

/// Context of one intercepted call.
///
/// Carries the inbound metadata, if the transport supplied any, and a
/// cancellation token that processors may observe while blocking.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    metadata: Option<Metadata>,
    cancellation: CancellationToken,
}

impl CallContext {
    /// Create a context without inbound metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context carrying the given inbound metadata.
    #[must_use]
    pub fn with_metadata(metadata: Metadata) -> Self {
        Self {
            metadata: Some(metadata),
            cancellation: CancellationToken::new(),
        }
    }

    /// Attach a cancellation token, e.g. a child of the server's shutdown token.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Inbound metadata, `None` when the call carried none.
    #[must_use]
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Whether the caller has cancelled the call.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
