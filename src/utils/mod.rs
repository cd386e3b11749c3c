//! Small shared utilities.

pub mod tokens;

pub use tokens::estimate_tokens;
