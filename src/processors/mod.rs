//! Concrete pipeline processors.
//!
//! - Validators: [`RequestValidator`], [`PrincipalFilter`]
//! - Mutators: [`LabelProcessor`], [`RuntimeInfoProcessor`]
//! - Backends: [`JsonLinesBackend`], [`TracingBackend`]

mod backend;
mod filter;
mod labels;
mod runtime;
mod validator;

pub use backend::*;
pub use filter::*;
pub use labels::*;
pub use runtime::*;
pub use validator::*;
