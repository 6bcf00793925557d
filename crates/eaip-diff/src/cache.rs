use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use eaip_types::{DocumentId, VersionId};

use crate::change::ChangeSet;
use crate::error::{DiffError, DiffResult};

/// Identity of a cached comparison between two snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub document: DocumentId,
    pub from: VersionId,
    pub to: VersionId,
}

impl CacheKey {
    pub fn new(document: DocumentId, from: VersionId, to: VersionId) -> Self {
        Self { document, from, to }
    }
}

/// Storage for computed change sets.
///
/// Snapshots are immutable, so a change set for a given key never goes
/// stale. Entries are written at most once: the first stored value wins and
/// is the one every later caller receives.
pub trait ChangeSetCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> DiffResult<Option<Arc<ChangeSet>>>;

    /// Store `set` unless an entry already exists; return the stored entry.
    fn insert_if_absent(&self, key: CacheKey, set: ChangeSet) -> DiffResult<Arc<ChangeSet>>;
}

/// `HashMap`-backed cache for tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryChangeSetCache {
    entries: RwLock<HashMap<CacheKey, Arc<ChangeSet>>>,
}

impl InMemoryChangeSetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> DiffResult<usize> {
        Ok(self
            .entries
            .read()
            .map_err(|_| DiffError::Cache("cache read lock poisoned".into()))?
            .len())
    }

    pub fn is_empty(&self) -> DiffResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl ChangeSetCache for InMemoryChangeSetCache {
    fn get(&self, key: &CacheKey) -> DiffResult<Option<Arc<ChangeSet>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| DiffError::Cache("cache read lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn insert_if_absent(&self, key: CacheKey, set: ChangeSet) -> DiffResult<Arc<ChangeSet>> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| DiffError::Cache("cache write lock poisoned".into()))?;
        Ok(entries.entry(key).or_insert_with(|| Arc::new(set)).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> CacheKey {
        CacheKey::new(
            DocumentId::new(),
            VersionId::from_hash([1; 32]),
            VersionId::from_hash([2; 32]),
        )
    }

    fn set(key: &CacheKey) -> ChangeSet {
        ChangeSet::new(key.document, Some(key.from), Some(key.to), vec![])
    }

    #[test]
    fn miss_then_hit() {
        let cache = InMemoryChangeSetCache::new();
        let k = key();
        assert!(cache.get(&k).unwrap().is_none());
        let stored = cache.insert_if_absent(k, set(&k)).unwrap();
        let hit = cache.get(&k).unwrap().unwrap();
        assert!(Arc::ptr_eq(&stored, &hit));
    }

    #[test]
    fn first_entry_wins() {
        let cache = InMemoryChangeSetCache::new();
        let k = key();
        let first = cache.insert_if_absent(k, set(&k)).unwrap();

        let mut other = set(&k);
        other.from = None;
        let second = cache.insert_if_absent(k, other).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.from, Some(k.from));
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn direction_is_part_of_the_key() {
        let cache = InMemoryChangeSetCache::new();
        let k = key();
        let reversed = CacheKey::new(k.document, k.to, k.from);
        cache.insert_if_absent(k, set(&k)).unwrap();
        assert!(cache.get(&reversed).unwrap().is_none());
        assert!(!cache.is_empty().unwrap());
    }
}
