use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Comparison with NULL is not allowed on column '{0}'")]
    NullLiteral(Arc<str>),
    #[error("Invalid arity for {op}: expected {expected}, got {got}")]
    InvalidArity {
        op: &'static str,
        expected: &'static str,
        got: usize,
    },
    #[error("Invalid regex '{pattern}' on column '{column}': {source}")]
    InvalidRegex {
        column: Arc<str>,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Range on column '{0}' requires a sorted dictionary")]
    RangeRequiresSortedDictionary(Arc<str>),
}
