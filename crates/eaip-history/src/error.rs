use serde::Serialize;
use thiserror::Error;

use eaip_diff::DiffError;
use eaip_store::StoreError;
use eaip_types::{DocumentId, OrganizationId, VersionId};

/// Errors surfaced by the history engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("snapshot not found: {0}")]
    SnapshotNotFound(VersionId),

    #[error("cannot compare snapshots of different documents: {left} vs {right}")]
    DocumentMismatch { left: DocumentId, right: DocumentId },

    /// The head kept moving; given up after `attempts` tries.
    #[error("concurrent head mismatch on {document} after {attempts} attempt(s)")]
    ConcurrentHeadMismatch { document: DocumentId, attempts: u32 },

    #[error("document {document} belongs to organization {stored}, not {given}")]
    OrganizationMismatch {
        document: DocumentId,
        stored: OrganizationId,
        given: OrganizationId,
    },

    #[error("invalid content: {0}")]
    InvalidContent(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("persistence backend error: {0}")]
    Backend(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse classification used by outer surfaces (HTTP status mapping).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidRequest,
    Internal,
}

impl HistoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DocumentNotFound(_) | Self::SnapshotNotFound(_) => ErrorKind::NotFound,
            Self::ConcurrentHeadMismatch { .. } => ErrorKind::Conflict,
            Self::DocumentMismatch { .. }
            | Self::OrganizationMismatch { .. }
            | Self::InvalidContent(_) => ErrorKind::InvalidRequest,
            Self::Serialization(_) | Self::Integrity(_) | Self::Backend(_) | Self::Config(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Whether the caller may reasonably try the same request again.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}

impl From<StoreError> for HistoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DocumentNotFound(id) => Self::DocumentNotFound(id),
            StoreError::SnapshotNotFound(id) => Self::SnapshotNotFound(id),
            StoreError::ConcurrentHeadMismatch { document, .. } => Self::ConcurrentHeadMismatch {
                document,
                attempts: 1,
            },
            StoreError::OrganizationMismatch {
                document,
                stored,
                given,
            } => Self::OrganizationMismatch {
                document,
                stored,
                given,
            },
            StoreError::InvalidContent(msg) => Self::InvalidContent(msg),
            StoreError::Serialization(msg) => Self::Serialization(msg),
            StoreError::IntegrityViolation { seq, reason } => {
                Self::Integrity(format!("seq {seq}: {reason}"))
            }
            StoreError::Backend(msg) => Self::Backend(msg),
        }
    }
}

impl From<DiffError> for HistoryError {
    fn from(err: DiffError) -> Self {
        match err {
            DiffError::DocumentMismatch { left, right } => Self::DocumentMismatch { left, right },
            DiffError::Store(store) => store.into(),
            DiffError::Cache(msg) => Self::Backend(msg),
        }
    }
}

/// Result alias for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;
