//! Audit request types flowing through the processing pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interceptor::StructValue;

/// Category of an audit log entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    #[default]
    Unspecified,
    /// Calls that modify configuration or metadata.
    AdminActivity,
    /// Calls that read or write user-provided data.
    DataAccess,
}

impl LogType {
    /// Returns the string representation used in labels and log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::AdminActivity => "admin_activity",
            Self::DataAccess => "data_access",
        }
    }
}

/// How a failure to produce the audit log affects the audited call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogMode {
    /// Resolved to the pipeline's default mode before processing.
    #[default]
    Unspecified,
    /// Logging failures are propagated to the caller.
    FailClose,
    /// Logging failures are recorded and swallowed.
    BestEffort,
}

impl LogMode {
    /// Returns the string representation used in log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::FailClose => "fail_close",
            Self::BestEffort => "best_effort",
        }
    }

    /// Whether a processing failure under this mode must fail the call.
    #[must_use]
    pub fn is_fail_close(&self) -> bool {
        matches!(self, Self::FailClose)
    }
}

/// Outcome of the audited call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallStatus {
    /// Numeric status code, following gRPC code numbering.
    pub code: i32,
    /// Human readable status message, empty on success.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// The body of an audit record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditPayload {
    /// Dotted method name, e.g. `pkg.Service.Method`.
    pub method_name: String,
    /// Dotted service name, e.g. `pkg.Service`.
    pub service_name: String,
    /// The resource the call acted on.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_name: String,
    /// Email of the authenticated caller.
    pub principal_email: String,
    /// Structured snapshot of the call's request, if captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<BTreeMap<String, StructValue>>,
    /// Structured snapshot of the call's response, if captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<BTreeMap<String, StructValue>>,
    /// Outcome of the call, empty until the handler has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CallStatus>,
    /// Free-form metadata attached by processors.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, StructValue>,
}

/// A request to produce one audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRequest {
    /// Category of the log entry.
    pub log_type: LogType,
    /// Failure handling mode for this request.
    pub mode: LogMode,
    /// The audit record body.
    pub payload: AuditPayload,
    /// Labels attached to the log entry.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Correlation id grouping entries of one operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// When the audited call was received.
    pub timestamp: DateTime<Utc>,
}

impl AuditRequest {
    /// Create a new builder for an audit request.
    #[must_use]
    pub fn builder(method_name: impl Into<String>) -> AuditRequestBuilder {
        AuditRequestBuilder::new(method_name)
    }
}

/// Builder for creating audit requests.
#[derive(Debug, Clone)]
pub struct AuditRequestBuilder {
    log_type: LogType,
    mode: LogMode,
    payload: AuditPayload,
    labels: BTreeMap<String, String>,
    operation: Option<String>,
    timestamp: DateTime<Utc>,
}

impl AuditRequestBuilder {
    /// Create a new builder for the given method.
    pub fn new(method_name: impl Into<String>) -> Self {
        Self {
            log_type: LogType::Unspecified,
            mode: LogMode::Unspecified,
            payload: AuditPayload {
                method_name: method_name.into(),
                ..AuditPayload::default()
            },
            labels: BTreeMap::new(),
            operation: None,
            timestamp: Utc::now(),
        }
    }

    /// Set the log type.
    #[must_use]
    pub fn log_type(mut self, log_type: LogType) -> Self {
        self.log_type = log_type;
        self
    }

    /// Set the log mode.
    #[must_use]
    pub fn mode(mut self, mode: LogMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the service name.
    #[must_use]
    pub fn service_name(mut self, service_name: impl Into<String>) -> Self {
        self.payload.service_name = service_name.into();
        self
    }

    /// Set the resource name.
    #[must_use]
    pub fn resource_name(mut self, resource_name: impl Into<String>) -> Self {
        self.payload.resource_name = resource_name.into();
        self
    }

    /// Set the principal email.
    #[must_use]
    pub fn principal_email(mut self, principal_email: impl Into<String>) -> Self {
        self.payload.principal_email = principal_email.into();
        self
    }

    /// Set the request snapshot.
    #[must_use]
    pub fn request(mut self, request: Option<BTreeMap<String, StructValue>>) -> Self {
        self.payload.request = request;
        self
    }

    /// Add a label.
    #[must_use]
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Set the operation correlation id.
    #[must_use]
    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Set a custom timestamp.
    #[must_use]
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Build the audit request.
    #[must_use]
    pub fn build(self) -> AuditRequest {
        AuditRequest {
            log_type: self.log_type,
            mode: self.mode,
            payload: self.payload,
            labels: self.labels,
            operation: self.operation,
            timestamp: self.timestamp,
        }
    }
}
