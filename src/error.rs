//! Error types for table extraction.

use thiserror::Error;

/// Errors raised while compiling queries.
///
/// Traversal itself never fails: every query is compiled and validated
/// before the first node is visited.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid XPath expression {expr:?} at offset {offset}: {reason}")]
    XPath {
        expr: String,
        offset: usize,
        reason: String,
    },

    #[error("invalid CSS selector {expr:?}: {reason}")]
    Selector { expr: String, reason: String },

    #[error("{role} query {expr:?} selects only values, but must select element nodes")]
    ValueQuery { role: &'static str, expr: String },
}

pub type Result<T> = std::result::Result<T, Error>;
