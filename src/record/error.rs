use thiserror::Error;

/// Failure while moving a [`GenericRow`](crate::record::GenericRow) across a byte boundary.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("failed to encode row: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("buffer does not decode to a field mapping: {0}")]
    Decode(#[source] serde_json::Error),
}
