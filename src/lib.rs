//! Audit Logging - decide whether, by whom and how strictly intercepted calls are audited.

pub mod audit;
pub mod config;
pub mod context;
pub mod interceptor;
pub mod pipeline;
pub mod processors;
pub mod rules;
pub mod security;
