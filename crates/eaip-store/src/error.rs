use eaip_types::{DocumentId, HasherError, OrganizationId, TypeError, VersionId};

/// Errors from snapshot store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No live document exists with this id.
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// The snapshot is unknown, or belongs to a different document than the
    /// caller asserted.
    #[error("snapshot not found: {0}")]
    SnapshotNotFound(VersionId),

    /// Another snapshot was appended between read and write.
    #[error("concurrent head mismatch on {document}: expected {expected:?}, found {actual:?}")]
    ConcurrentHeadMismatch {
        document: DocumentId,
        expected: Option<VersionId>,
        actual: Option<VersionId>,
    },

    /// A write named a different organization than the stored document's.
    #[error("document {document} belongs to organization {stored}, not {given}")]
    OrganizationMismatch {
        document: DocumentId,
        stored: OrganizationId,
        given: OrganizationId,
    },

    /// Content breaks a structural rule of the document tree.
    #[error("invalid content: {0}")]
    InvalidContent(String),

    /// Content failed to encode, decode, or round-trip exactly.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A record would break the chain's structure.
    #[error("integrity violation at seq {seq}: {reason}")]
    IntegrityViolation { seq: u64, reason: String },

    /// The persistence backend failed (e.g. a poisoned lock).
    #[error("persistence backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether a retry against a fresh head may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrentHeadMismatch { .. })
    }
}

impl From<HasherError> for StoreError {
    fn from(err: HasherError) -> Self {
        match err {
            HasherError::Serialization(msg) => Self::Serialization(msg),
        }
    }
}

impl From<TypeError> for StoreError {
    fn from(err: TypeError) -> Self {
        Self::InvalidContent(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
