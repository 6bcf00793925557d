use std::sync::Arc;

use tracing::{debug, info, warn};

use eaip_diff::{ChangeSet, DiffEngine, InMemoryChangeSetCache};
use eaip_store::{
    ChainReport, HistoryIter, InMemorySnapshotPersistence, Snapshot, SnapshotMeta,
    SnapshotPersistence, SnapshotStore,
};
use eaip_types::{Actor, Document, DocumentId, VersionId};

use crate::audit::{deliver, AuditAction, AuditEvent, AuditSink, NoopAuditSink};
use crate::config::HistoryConfig;
use crate::error::HistoryResult;
use crate::restore::RestoreCoordinator;
use crate::retry::retry_on_conflict;

/// Entry point of the history engine.
///
/// Ties the snapshot store, diff engine and restore coordinator to one
/// persistence backend and one audit sink. Cloning is cheap and every clone
/// shares the same backend.
#[derive(Clone)]
pub struct VersionHistory {
    store: SnapshotStore,
    diff: DiffEngine,
    restore: RestoreCoordinator,
    audit: Arc<dyn AuditSink>,
    config: HistoryConfig,
}

impl VersionHistory {
    pub fn new(
        persistence: Arc<dyn SnapshotPersistence>,
        audit: Arc<dyn AuditSink>,
        config: HistoryConfig,
    ) -> Self {
        let store = SnapshotStore::new(persistence);
        let mut diff = DiffEngine::new(store.clone());
        if config.cache_diffs {
            diff = diff.with_cache(Arc::new(InMemoryChangeSetCache::new()));
        }
        let restore = RestoreCoordinator::new(store.clone(), audit.clone(), config.max_attempts);
        Self {
            store,
            diff,
            restore,
            audit,
            config,
        }
    }

    /// An engine over fresh in-memory persistence that discards audit events.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemorySnapshotPersistence::new()),
            Arc::new(NoopAuditSink),
            HistoryConfig::default(),
        )
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Create or update a live document.
    pub fn put_document(&self, document: &Document) -> HistoryResult<()> {
        Ok(self.store.put_document(document)?)
    }

    pub fn document(&self, id: &DocumentId) -> HistoryResult<Document> {
        Ok(self.store.document(id)?)
    }

    /// Snapshot the live document, retrying when a concurrent writer moved
    /// the head first.
    pub fn create_snapshot(
        &self,
        document: &DocumentId,
        author: &Actor,
        message: &str,
    ) -> HistoryResult<Snapshot> {
        let snapshot = retry_on_conflict(document, self.config.max_attempts, || {
            self.store.create_snapshot(document, author, message)
        })?;

        let event = AuditEvent::new(
            *document,
            snapshot.meta.organization,
            author.clone(),
            AuditAction::SnapshotCreated,
            snapshot.id(),
        )
        .with_detail("seq", snapshot.meta.seq.to_string());
        deliver(self.audit.as_ref(), &event);
        Ok(snapshot)
    }

    /// Newest-first history headers, at most `limit` of them (the configured
    /// page size when `None`).
    pub fn history(
        &self,
        document: &DocumentId,
        limit: Option<usize>,
    ) -> HistoryResult<Vec<SnapshotMeta>> {
        let limit = limit.unwrap_or(self.config.history_limit);
        Ok(self.store.history_page(document, limit)?)
    }

    /// Lazy newest-first walk over the whole chain.
    pub fn history_iter(&self, document: &DocumentId) -> HistoryResult<HistoryIter> {
        Ok(self.store.get_history(document)?)
    }

    /// Load one snapshot of `document`, reporting the access to the audit sink.
    pub fn snapshot(
        &self,
        document: &DocumentId,
        version: &VersionId,
        actor: &Actor,
    ) -> HistoryResult<Snapshot> {
        let snapshot = self.store.get_snapshot(version, document)?;
        let event = AuditEvent::new(
            *document,
            snapshot.meta.organization,
            actor.clone(),
            AuditAction::VersionAccessed,
            snapshot.id(),
        );
        deliver(self.audit.as_ref(), &event);
        Ok(snapshot)
    }

    pub fn head(&self, document: &DocumentId) -> HistoryResult<Option<SnapshotMeta>> {
        self.store.document(document)?;
        Ok(self.store.head(document)?)
    }

    /// Changes from `from` to `to`, both snapshots of `document`.
    ///
    /// A version that belongs to another document is reported as
    /// `SnapshotNotFound`, the same answer [`snapshot`](Self::snapshot) gives;
    /// `DocumentMismatch` never surfaces here.
    pub fn compare(
        &self,
        document: &DocumentId,
        from: &VersionId,
        to: &VersionId,
        actor: &Actor,
    ) -> HistoryResult<Arc<ChangeSet>> {
        let set = self.diff.compare_versions(document, from, to)?;
        self.audit_comparison(document, actor, from, to.to_hex());
        Ok(set)
    }

    /// Changes introduced by the head snapshot, or `None` for a chain
    /// shorter than two.
    pub fn compare_with_previous(
        &self,
        document: &DocumentId,
        actor: &Actor,
    ) -> HistoryResult<Option<Arc<ChangeSet>>> {
        let set = self.diff.compare_with_previous(document)?;
        if let Some((from, to)) = set.as_ref().and_then(|s| s.from.zip(s.to)) {
            self.audit_comparison(document, actor, &from, to.to_hex());
        }
        Ok(set)
    }

    /// Changes between a snapshot and the unsnapshotted live state.
    pub fn compare_with_live(
        &self,
        document: &DocumentId,
        version: &VersionId,
        actor: &Actor,
    ) -> HistoryResult<ChangeSet> {
        let set = self.diff.compare_with_live(document, version)?;
        self.audit_comparison(document, actor, version, "live".to_string());
        Ok(set)
    }

    /// Comparisons carry no organization of their own; a failed lookup skips
    /// the event rather than the answer.
    fn audit_comparison(&self, document: &DocumentId, actor: &Actor, from: &VersionId, to: String) {
        let organization = match self.store.document(document) {
            Ok(live) => live.organization,
            Err(err) => {
                warn!(document = %document, error = %err, "comparison not audited");
                return;
            }
        };
        let event = AuditEvent::new(
            *document,
            organization,
            actor.clone(),
            AuditAction::VersionsCompared,
            *from,
        )
        .with_detail("to", to);
        deliver(self.audit.as_ref(), &event);
    }

    /// Make `version` the live content again by appending a restore snapshot.
    pub fn restore(
        &self,
        document: &DocumentId,
        version: &VersionId,
        actor: &Actor,
    ) -> HistoryResult<Snapshot> {
        self.restore.restore(document, version, actor)
    }

    pub fn validate(&self, document: &DocumentId) -> HistoryResult<ChainReport> {
        let report = self.store.validate_chain(document)?;
        debug!(document = %document, valid = report.is_valid(), "chain validated");
        Ok(report)
    }

    /// Validate every document the backend knows about.
    pub fn validate_all(&self) -> HistoryResult<Vec<ChainReport>> {
        let reports = eaip_store::ChainValidator::validate_all(self.store.persistence().as_ref())?;
        let invalid = reports.iter().filter(|r| !r.is_valid()).count();
        info!(documents = reports.len(), invalid, "validated all chains");
        Ok(reports)
    }
}
