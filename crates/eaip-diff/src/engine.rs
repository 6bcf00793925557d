use std::sync::Arc;

use tracing::debug;

use eaip_store::SnapshotStore;
use eaip_types::{DocumentId, VersionId};

use crate::cache::{CacheKey, ChangeSetCache};
use crate::change::ChangeSet;
use crate::compare::{compare, compare_contents};
use crate::error::DiffResult;

/// Store-backed comparisons with optional change set caching.
///
/// Diffing is read-only; the only write is the cache's idempotent
/// write-if-absent.
#[derive(Clone)]
pub struct DiffEngine {
    store: SnapshotStore,
    cache: Option<Arc<dyn ChangeSetCache>>,
}

impl DiffEngine {
    pub fn new(store: SnapshotStore) -> Self {
        Self { store, cache: None }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ChangeSetCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Compare two snapshots of `document`.
    ///
    /// Both versions must belong to `document`; otherwise the foreign one is
    /// reported as not found. Both loads are scoped to `document`, so
    /// [`DocumentMismatch`](crate::DiffError::DocumentMismatch) only comes from [`compare`] on
    /// snapshots loaded by the caller.
    pub fn compare_versions(
        &self,
        document: &DocumentId,
        from: &VersionId,
        to: &VersionId,
    ) -> DiffResult<Arc<ChangeSet>> {
        let key = CacheKey::new(*document, *from, *to);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key)? {
                debug!(document = %document, from = %from.short_hex(), to = %to.short_hex(), "change set cache hit");
                return Ok(hit);
            }
        }

        let old = self.store.get_snapshot(from, document)?;
        let new = self.store.get_snapshot(to, document)?;
        let set = compare(&old, &new)?;
        debug!(
            document = %document,
            from = %from.short_hex(),
            to = %to.short_hex(),
            changes = set.len(),
            "computed change set"
        );

        match &self.cache {
            Some(cache) => cache.insert_if_absent(key, set),
            None => Ok(Arc::new(set)),
        }
    }

    /// Compare the head snapshot with its predecessor.
    ///
    /// Returns `Ok(None)` when the document has fewer than two snapshots.
    pub fn compare_with_previous(&self, document: &DocumentId) -> DiffResult<Option<Arc<ChangeSet>>> {
        self.store.document(document)?;
        let Some(head) = self.store.head(document)? else {
            return Ok(None);
        };
        let Some(parent) = head.parent else {
            return Ok(None);
        };
        self.compare_versions(document, &parent, &head.id).map(Some)
    }

    /// Compare a snapshot with the document's current live state.
    pub fn compare_with_live(&self, document: &DocumentId, version: &VersionId) -> DiffResult<ChangeSet> {
        let snapshot = self.store.get_snapshot(version, document)?;
        let live = self.store.document(document)?;
        let mut set = compare_contents(*document, &snapshot.content, &live.content);
        set.from = Some(*version);
        Ok(set)
    }
}
