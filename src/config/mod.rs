//! Configuration module.

mod build;
mod loader;
mod types;

pub use build::*;
pub use loader::*;
pub use types::*;
