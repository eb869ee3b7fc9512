//! Audit request processing pipeline.
//!
//! A [`Client`] runs each request through three ordered stages:
//! validators, mutators and backends. Processors signal "do not audit" with
//! [`ProcessorError::PreconditionFailed`]; any other error is handled
//! according to the request's [`LogMode`](crate::audit::LogMode).

mod client;
mod processor;

pub use client::*;
pub use processor::*;
