//! Interception of unary calls for audit logging.
//!
//! # Components
//!
//! - [`AuditInterceptor`]: Wraps a handler, builds the audit request and submits it
//! - [`MethodName`]: Splits `/pkg.Service/Method` into matchable names
//! - [`StructValue`]: Structured snapshot of request and response payloads
//! - [`Status`]: Error status returned by handlers

mod handler;
mod method;
mod status;
mod structured;

pub use handler::*;
pub use method::*;
pub use status::*;
pub use structured::*;
