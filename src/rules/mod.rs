//! Selector-based audit rules and the matcher picking the governing rule.

mod matcher;
mod rule;

pub use matcher::*;
pub use rule::*;
