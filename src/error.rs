// Store-level error type.

use crate::diff::PatchError;

/// Errors surfaced by [`VersionStore`](crate::store::VersionStore) and the
/// file helpers in [`io`](crate::io).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Requested version number is outside `1..=available`.
    #[error("version {requested} not found (store holds {available})")]
    VersionNotFound { requested: usize, available: usize },

    /// A stored delta could not be replayed.
    #[error("corrupt delta producing version {version}: {source}")]
    CorruptDelta {
        version: usize,
        #[source]
        source: PatchError,
    },

    /// A persisted record is missing fields or holds an ill-formed delta.
    #[error("corrupt store: {0}")]
    CorruptStore(String),

    /// Underlying read/write failure.
    #[error("I/O failure: {0}")]
    IoFailure(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
