//! Version history engine for eAIP documents.
//!
//! [`VersionHistory`] is the façade outer surfaces talk to. It combines the
//! snapshot store, the diff engine and the [`RestoreCoordinator`] over one
//! persistence backend, retries appends that lose a head race, and reports
//! every snapshot and restore to an [`AuditSink`].
//!
//! # Example
//!
//! ```
//! use eaip_history::VersionHistory;
//! use eaip_types::{Actor, Document, DocumentContent, DocumentId, DocumentMetadata, OrganizationId};
//!
//! let history = VersionHistory::in_memory();
//! let doc = Document::new(
//!     DocumentId::new(),
//!     OrganizationId::new(),
//!     DocumentContent::new(DocumentMetadata::new("eAIP", "LT")),
//! );
//! history.put_document(&doc).unwrap();
//!
//! let v1 = history.create_snapshot(&doc.id, &Actor::system(), "initial").unwrap();
//! let v2 = history.restore(&doc.id, &v1.id(), &Actor::system()).unwrap();
//! assert_eq!(v2.parent(), Some(v1.id()));
//! ```

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod restore;
mod retry;

pub use audit::{
    deliver, AuditAction, AuditError, AuditEvent, AuditSink, MemoryAuditSink, NoopAuditSink,
    TracingAuditSink,
};
pub use config::HistoryConfig;
pub use engine::VersionHistory;
pub use error::{ErrorKind, HistoryError, HistoryResult};
pub use restore::{restore_message, RestoreCoordinator};

pub use eaip_diff::{Change, ChangeAction, ChangeSet, ChangeSummary, ChangeType};
pub use eaip_store::{ChainReport, Snapshot, SnapshotKind, SnapshotMeta};
