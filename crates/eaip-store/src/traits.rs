//! The [`SnapshotPersistence`] trait: the storage boundary of the engine.
//!
//! Any backend (in-memory, relational, document database) implements this
//! trait. The store never mutates a chain except through the two
//! conditional appends, which compare-and-swap the document's head.

use eaip_types::{Document, DocumentContent, DocumentId, VersionId};

use crate::error::StoreResult;
use crate::snapshot::SnapshotRecord;

/// Storage backend for live documents and their snapshot chains.
///
/// Implementations must be thread-safe (`Send + Sync`). Each conditional
/// append is a single atomic step: either the record is stored and the head
/// advances, or nothing changes.
pub trait SnapshotPersistence: Send + Sync {
    /// Read the live document. Returns `Ok(None)` if it does not exist.
    fn read_document(&self, id: &DocumentId) -> StoreResult<Option<Document>>;

    /// Create or update a live document.
    ///
    /// The stored head pointer and owning organization are authoritative:
    /// the head is preserved on update and only ever moved by the
    /// conditional appends, and an update naming another organization fails
    /// with `OrganizationMismatch` without changing anything.
    fn write_document(&self, document: &Document) -> StoreResult<()>;

    /// Append `record` and advance the head to it, provided the current head
    /// equals `expected_head`.
    ///
    /// Fails with `ConcurrentHeadMismatch` if the head moved, and with
    /// `DocumentNotFound` if the document does not exist.
    fn append_snapshot(
        &self,
        record: &SnapshotRecord,
        expected_head: Option<&VersionId>,
    ) -> StoreResult<()>;

    /// Replace the live content with `content` and append `record`, in one
    /// transactional step guarded by the same head check as
    /// [`append_snapshot`](Self::append_snapshot).
    fn replace_and_append(
        &self,
        content: &DocumentContent,
        record: &SnapshotRecord,
        expected_head: Option<&VersionId>,
    ) -> StoreResult<()>;

    /// Read a snapshot record by version id.
    fn read_snapshot(&self, id: &VersionId) -> StoreResult<Option<SnapshotRecord>>;

    /// Current head of a document's chain. `Ok(None)` if it has no snapshots.
    fn read_head(&self, document: &DocumentId) -> StoreResult<Option<VersionId>>;

    /// All records of a document's chain, oldest first.
    fn read_chain(&self, document: &DocumentId) -> StoreResult<Vec<SnapshotRecord>>;

    /// Ids of every live document.
    fn documents(&self) -> StoreResult<Vec<DocumentId>>;
}
