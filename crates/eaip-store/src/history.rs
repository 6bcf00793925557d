use std::sync::Arc;

use eaip_types::{DocumentId, VersionId};

use crate::error::{StoreError, StoreResult};
use crate::snapshot::SnapshotMeta;
use crate::traits::SnapshotPersistence;

/// Lazy walk of a document's chain from a starting version back to the
/// first snapshot, newest first.
///
/// Each step reads one record, so callers that only need a page never load
/// the whole chain. The iterator can be cloned or [`restart`](Self::restart)ed
/// to walk the same chain again; a broken link yields one error and ends the
/// walk.
#[derive(Clone)]
pub struct HistoryIter {
    persistence: Arc<dyn SnapshotPersistence>,
    document: DocumentId,
    start: Option<VersionId>,
    next: Option<VersionId>,
}

impl HistoryIter {
    pub fn new(
        persistence: Arc<dyn SnapshotPersistence>,
        document: DocumentId,
        start: Option<VersionId>,
    ) -> Self {
        Self {
            persistence,
            document,
            start,
            next: start,
        }
    }

    pub fn document(&self) -> DocumentId {
        self.document
    }

    /// Rewind to the version the walk started from.
    pub fn restart(&mut self) {
        self.next = self.start;
    }
}

impl Iterator for HistoryIter {
    type Item = StoreResult<SnapshotMeta>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        match self.persistence.read_snapshot(&id) {
            Ok(Some(record)) if record.meta.document == self.document => {
                self.next = record.meta.parent;
                Some(Ok(record.meta))
            }
            Ok(_) => Some(Err(StoreError::IntegrityViolation {
                seq: 0,
                reason: format!("chain link {} is missing", id.short_hex()),
            })),
            Err(err) => Some(Err(err)),
        }
    }
}
