use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use eaip_types::{Document, DocumentContent, DocumentId, VersionId};

use crate::error::{StoreError, StoreResult};
use crate::snapshot::SnapshotRecord;
use crate::traits::SnapshotPersistence;

/// In-memory persistence for tests, the CLI and the demo server.
///
/// All state sits behind one `RwLock`; each conditional append is a single
/// write-locked critical section, which makes the head check and the write
/// atomic.
pub struct InMemorySnapshotPersistence {
    inner: RwLock<PersistenceState>,
}

#[derive(Default)]
struct PersistenceState {
    documents: HashMap<DocumentId, Document>,
    snapshots: HashMap<VersionId, SnapshotRecord>,
    chains: HashMap<DocumentId, Vec<VersionId>>,
}

impl PersistenceState {
    fn check_append(
        &self,
        record: &SnapshotRecord,
        expected_head: Option<&VersionId>,
    ) -> StoreResult<()> {
        let meta = &record.meta;
        let document = self
            .documents
            .get(&meta.document)
            .ok_or(StoreError::DocumentNotFound(meta.document))?;

        if document.head.as_ref() != expected_head {
            return Err(StoreError::ConcurrentHeadMismatch {
                document: meta.document,
                expected: expected_head.copied(),
                actual: document.head,
            });
        }

        if meta.parent != document.head {
            return Err(StoreError::IntegrityViolation {
                seq: meta.seq,
                reason: "record does not extend the current head".into(),
            });
        }

        let expected_seq = self.chains.get(&meta.document).map_or(0, Vec::len) as u64 + 1;
        if meta.seq != expected_seq {
            return Err(StoreError::IntegrityViolation {
                seq: meta.seq,
                reason: format!("append attempted out of order; expected seq {expected_seq}"),
            });
        }

        if self.snapshots.contains_key(&meta.id) {
            return Err(StoreError::IntegrityViolation {
                seq: meta.seq,
                reason: format!("version {} already exists", meta.id.short_hex()),
            });
        }

        Ok(())
    }

    fn commit(&mut self, record: &SnapshotRecord) {
        let id = record.meta.id;
        let document_id = record.meta.document;
        self.snapshots.insert(id, record.clone());
        self.chains.entry(document_id).or_default().push(id);
        if let Some(document) = self.documents.get_mut(&document_id) {
            document.head = Some(id);
        }
    }
}

impl InMemorySnapshotPersistence {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(PersistenceState::default()),
        }
    }

    /// Total number of snapshot records across all documents.
    pub fn snapshot_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.snapshots.len())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, PersistenceState>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("snapshot state read lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, PersistenceState>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("snapshot state write lock poisoned".into()))
    }

    /// Overwrite a stored record in place, bypassing every check.
    #[cfg(test)]
    pub(crate) fn tamper(&self, record: SnapshotRecord) {
        let mut state = self.inner.write().unwrap();
        state.snapshots.insert(record.meta.id, record);
    }
}

impl Default for InMemorySnapshotPersistence {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotPersistence for InMemorySnapshotPersistence {
    fn read_document(&self, id: &DocumentId) -> StoreResult<Option<Document>> {
        Ok(self.read()?.documents.get(id).cloned())
    }

    fn write_document(&self, document: &Document) -> StoreResult<()> {
        let mut state = self.write()?;
        let mut stored = document.clone();
        if let Some(existing) = state.documents.get(&document.id) {
            if existing.organization != document.organization {
                return Err(StoreError::OrganizationMismatch {
                    document: document.id,
                    stored: existing.organization,
                    given: document.organization,
                });
            }
            stored.head = existing.head;
        } else {
            stored.head = None;
        }
        state.documents.insert(document.id, stored);
        Ok(())
    }

    fn append_snapshot(
        &self,
        record: &SnapshotRecord,
        expected_head: Option<&VersionId>,
    ) -> StoreResult<()> {
        let mut state = self.write()?;
        state.check_append(record, expected_head)?;
        state.commit(record);
        Ok(())
    }

    fn replace_and_append(
        &self,
        content: &DocumentContent,
        record: &SnapshotRecord,
        expected_head: Option<&VersionId>,
    ) -> StoreResult<()> {
        let mut state = self.write()?;
        state.check_append(record, expected_head)?;
        if let Some(document) = state.documents.get_mut(&record.meta.document) {
            document.content = content.clone();
            document.updated_at = Utc::now();
            document.updated_by = Some(record.meta.author.id);
        }
        state.commit(record);
        Ok(())
    }

    fn read_snapshot(&self, id: &VersionId) -> StoreResult<Option<SnapshotRecord>> {
        Ok(self.read()?.snapshots.get(id).cloned())
    }

    fn read_head(&self, document: &DocumentId) -> StoreResult<Option<VersionId>> {
        Ok(self.read()?.documents.get(document).and_then(|d| d.head))
    }

    fn read_chain(&self, document: &DocumentId) -> StoreResult<Vec<SnapshotRecord>> {
        let state = self.read()?;
        let Some(chain) = state.chains.get(document) else {
            return Ok(vec![]);
        };
        Ok(chain
            .iter()
            .filter_map(|id| state.snapshots.get(id).cloned())
            .collect())
    }

    fn documents(&self) -> StoreResult<Vec<DocumentId>> {
        let mut ids: Vec<_> = self.read()?.documents.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}
