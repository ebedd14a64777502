//! Error types for the batch helpers.

use ravro_core::CodecError;

/// Failure of one item inside [`decode_batch`](crate::decode_batch) or
/// [`encode_batch`](crate::encode_batch).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("batch item {index}: {source}")]
pub struct BatchError {
    /// Position of the failing item in the input slice.
    pub index: usize,
    #[source]
    pub source: CodecError,
}
