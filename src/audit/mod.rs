//! Audit request data model.

mod types;

pub use types::{AuditPayload, AuditRequest, AuditRequestBuilder, CallStatus, LogMode, LogType};
