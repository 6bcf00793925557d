//! Error types for the diff crate.

use eaip_types::DocumentId;

/// Errors that can occur during diff operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// The two snapshots belong to different documents.
    #[error("cannot compare snapshots of different documents: {left} vs {right}")]
    DocumentMismatch { left: DocumentId, right: DocumentId },

    /// Loading a snapshot or the live document failed.
    #[error("store error: {0}")]
    Store(#[from] eaip_store::StoreError),

    /// The change set cache backend failed.
    #[error("cache error: {0}")]
    Cache(String),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
