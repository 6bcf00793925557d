use std::sync::Arc;

use tracing::{debug, info, warn};

use eaip_types::{Actor, Document, DocumentContent, DocumentId, Timestamp, VersionId};

use crate::codec;
use crate::error::{StoreError, StoreResult};
use crate::history::HistoryIter;
use crate::memory::InMemorySnapshotPersistence;
use crate::snapshot::{Snapshot, SnapshotKind, SnapshotMeta, SnapshotRecord};
use crate::traits::SnapshotPersistence;
use crate::validation::{ChainReport, ChainValidator};

/// The Snapshot Store: records immutable snapshots of live documents and
/// answers history queries over each document's chain.
///
/// The store holds no state of its own. Every mutation is a conditional
/// append against the persistence collaborator, so two stores sharing one
/// backend stay consistent.
#[derive(Clone)]
pub struct SnapshotStore {
    persistence: Arc<dyn SnapshotPersistence>,
}

impl SnapshotStore {
    pub fn new(persistence: Arc<dyn SnapshotPersistence>) -> Self {
        Self { persistence }
    }

    /// A store backed by fresh in-memory persistence.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemorySnapshotPersistence::new()))
    }

    pub fn persistence(&self) -> &Arc<dyn SnapshotPersistence> {
        &self.persistence
    }

    /// Write live document state. The head pointer is left untouched.
    ///
    /// Fails with `InvalidContent` on duplicate section or subsection ids and
    /// with `OrganizationMismatch` if the document is stored under another
    /// organization.
    pub fn put_document(&self, document: &Document) -> StoreResult<()> {
        document.content.check_ids()?;
        debug!(document = %document.id, "writing live document");
        self.persistence.write_document(document)
    }

    /// Read the live document.
    pub fn document(&self, id: &DocumentId) -> StoreResult<Document> {
        self.persistence
            .read_document(id)?
            .ok_or(StoreError::DocumentNotFound(*id))
    }

    /// Snapshot the document's current live content and advance its head.
    pub fn create_snapshot(
        &self,
        document_id: &DocumentId,
        author: &Actor,
        message: &str,
    ) -> StoreResult<Snapshot> {
        let document = self.document(document_id)?;
        let record = self.prepare(&document, &document.content, author, message, SnapshotKind::Edit)?;

        self.persistence
            .append_snapshot(&record, document.head.as_ref())
            .inspect_err(|err| log_append_failure(document_id, err))?;

        info!(
            document = %document_id,
            version = %record.meta.id.short_hex(),
            seq = record.meta.seq,
            "snapshot created"
        );
        Ok(Snapshot {
            meta: record.meta,
            content: document.content,
        })
    }

    /// Make `target`'s content live again and record that as a new head
    /// snapshot, in one transactional persistence call.
    ///
    /// The chain is never rewound: the new snapshot extends the current head.
    pub fn append_restore(
        &self,
        document_id: &DocumentId,
        target: &Snapshot,
        author: &Actor,
        message: &str,
    ) -> StoreResult<Snapshot> {
        if target.document() != *document_id {
            return Err(StoreError::SnapshotNotFound(target.id()));
        }
        let document = self.document(document_id)?;
        let kind = SnapshotKind::Restore { from: target.id() };
        let record = self.prepare(&document, &target.content, author, message, kind)?;

        self.persistence
            .replace_and_append(&target.content, &record, document.head.as_ref())
            .inspect_err(|err| log_append_failure(document_id, err))?;

        info!(
            document = %document_id,
            version = %record.meta.id.short_hex(),
            from = %target.id().short_hex(),
            "snapshot restored"
        );
        Ok(Snapshot {
            meta: record.meta,
            content: target.content.clone(),
        })
    }

    /// Lazy history of a document, newest first.
    pub fn get_history(&self, document_id: &DocumentId) -> StoreResult<HistoryIter> {
        let document = self.document(document_id)?;
        Ok(HistoryIter::new(
            self.persistence.clone(),
            *document_id,
            document.head,
        ))
    }

    /// At most `limit` history entries, newest first.
    pub fn history_page(&self, document_id: &DocumentId, limit: usize) -> StoreResult<Vec<SnapshotMeta>> {
        self.get_history(document_id)?.take(limit).collect()
    }

    /// Load a snapshot, asserting which document it belongs to.
    ///
    /// A snapshot owned by another document is reported as not found, so
    /// version ids never leak across documents.
    pub fn get_snapshot(
        &self,
        version: &VersionId,
        expected_document: &DocumentId,
    ) -> StoreResult<Snapshot> {
        debug!(version = %version.short_hex(), document = %expected_document, "loading snapshot");
        let record = self
            .persistence
            .read_snapshot(version)?
            .filter(|record| record.meta.document == *expected_document)
            .ok_or(StoreError::SnapshotNotFound(*version))?;
        let content = codec::decode(&record.payload)?;
        Ok(Snapshot {
            meta: record.meta,
            content,
        })
    }

    /// Header of the newest snapshot, if any.
    pub fn head(&self, document_id: &DocumentId) -> StoreResult<Option<SnapshotMeta>> {
        match self.persistence.read_head(document_id)? {
            None => Ok(None),
            Some(id) => Ok(self.read_meta(&id)?),
        }
    }

    /// The newest snapshot with content, if any.
    pub fn head_snapshot(&self, document_id: &DocumentId) -> StoreResult<Option<Snapshot>> {
        match self.persistence.read_head(document_id)? {
            None => Ok(None),
            Some(id) => self.get_snapshot(&id, document_id).map(Some),
        }
    }

    /// Run the chain validator over a document.
    pub fn validate_chain(&self, document_id: &DocumentId) -> StoreResult<ChainReport> {
        self.document(document_id)?;
        let report = ChainValidator::validate(self.persistence.as_ref(), document_id)?;
        if !report.is_valid() {
            warn!(
                document = %document_id,
                violations = report.violations.len(),
                "chain validation failed"
            );
        }
        Ok(report)
    }

    fn read_meta(&self, id: &VersionId) -> StoreResult<Option<SnapshotMeta>> {
        Ok(self.persistence.read_snapshot(id)?.map(|record| record.meta))
    }

    fn prepare(
        &self,
        document: &Document,
        content: &DocumentContent,
        author: &Actor,
        message: &str,
        kind: SnapshotKind,
    ) -> StoreResult<SnapshotRecord> {
        let parent = match &document.head {
            None => None,
            Some(head) => Some(self.read_meta(head)?.ok_or_else(|| {
                StoreError::IntegrityViolation {
                    seq: 0,
                    reason: format!("head {} has no stored snapshot", head.short_hex()),
                }
            })?),
        };

        content.check_ids()?;
        let payload = codec::encode_verified(content)?;
        let mut meta = SnapshotMeta {
            id: VersionId::from_hash([0; 32]),
            document: document.id,
            organization: document.organization,
            parent: document.head,
            seq: parent.as_ref().map_or(1, |p| p.seq + 1),
            content_hash: codec::content_hash(&payload),
            author: author.clone(),
            message: message.to_string(),
            kind,
            timestamp: Timestamp::successor_of(parent.as_ref().map(|p| &p.timestamp)),
        };
        meta.id = meta.compute_id()?;
        Ok(SnapshotRecord { meta, payload })
    }
}

fn log_append_failure(document: &DocumentId, err: &StoreError) {
    if err.is_conflict() {
        warn!(document = %document, error = %err, "snapshot append lost a head race");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eaip_types::{
        ActorId, DocumentMetadata, OrganizationId, Section, SectionType, Subsection,
    };

    fn author() -> Actor {
        Actor::new(ActorId::new(), "Editor", "editor@example.org")
    }

    fn seeded() -> (SnapshotStore, Document) {
        let store = SnapshotStore::in_memory();
        let content = DocumentContent::new(DocumentMetadata::new("eAIP", "LT")).with_section(
            Section::new("s-gen", SectionType::Gen, "General", 0)
                .with_subsection(Subsection::new("sub-1", "1.1", "Intro", 0).with_text("Hello")),
        );
        let doc = Document::new(DocumentId::new(), OrganizationId::new(), content);
        store.put_document(&doc).unwrap();
        (store, doc)
    }

    fn retitle(store: &SnapshotStore, doc: &DocumentId, title: &str) {
        let mut live = store.document(doc).unwrap();
        live.content.sections[0].subsections[0].title = title.into();
        store.put_document(&live).unwrap();
    }

    #[test]
    fn duplicate_section_ids_are_rejected_on_write() {
        let (store, doc) = seeded();
        let mut live = store.document(&doc.id).unwrap();
        live.content.sections.push(
            Section::new("s-gen", SectionType::Ad, "Aerodromes", 1)
                .with_subsection(Subsection::new("ad-1", "1.1", "Intro", 0)),
        );
        assert!(matches!(
            store.put_document(&live),
            Err(StoreError::InvalidContent(_))
        ));
        assert_eq!(store.document(&doc.id).unwrap().content, doc.content);
    }

    #[test]
    fn duplicate_ids_written_around_the_store_are_not_snapshotted() {
        let (store, doc) = seeded();
        let mut live = store.document(&doc.id).unwrap();
        let copy = live.content.sections[0].subsections[0].clone();
        live.content.sections[0].subsections.push(copy);
        store.persistence().write_document(&live).unwrap();

        assert!(matches!(
            store.create_snapshot(&doc.id, &author(), "dup"),
            Err(StoreError::InvalidContent(_))
        ));
        assert!(store.head(&doc.id).unwrap().is_none());
    }

    #[test]
    fn organization_is_kept_across_writes() {
        let (store, doc) = seeded();
        let v1 = store.create_snapshot(&doc.id, &author(), "one").unwrap();

        let mut moved = store.document(&doc.id).unwrap();
        moved.organization = OrganizationId::new();
        assert!(matches!(
            store.put_document(&moved),
            Err(StoreError::OrganizationMismatch { .. })
        ));

        let v2 = store.create_snapshot(&doc.id, &author(), "two").unwrap();
        assert_eq!(v2.meta.organization, v1.meta.organization);
    }

    #[test]
    fn first_snapshot_has_no_parent() {
        let (store, doc) = seeded();
        let v1 = store.create_snapshot(&doc.id, &author(), "initial").unwrap();
        assert_eq!(v1.parent(), None);
        assert_eq!(v1.meta.seq, 1);
        assert_eq!(v1.meta.kind, SnapshotKind::Edit);
        assert_eq!(v1.content, doc.content);
        assert_eq!(store.document(&doc.id).unwrap().head, Some(v1.id()));
    }

    #[test]
    fn snapshots_form_a_linear_chain() {
        let (store, doc) = seeded();
        let v1 = store.create_snapshot(&doc.id, &author(), "one").unwrap();
        retitle(&store, &doc.id, "Introduction");
        let v2 = store.create_snapshot(&doc.id, &author(), "two").unwrap();
        let v3 = store.create_snapshot(&doc.id, &author(), "three").unwrap();

        assert_eq!(v2.parent(), Some(v1.id()));
        assert_eq!(v3.parent(), Some(v2.id()));
        assert!(v1.meta.timestamp < v2.meta.timestamp);
        assert!(v2.meta.timestamp < v3.meta.timestamp);

        let ids: Vec<_> = store
            .get_history(&doc.id)
            .unwrap()
            .map(|m| m.unwrap().id)
            .collect();
        assert_eq!(ids, vec![v3.id(), v2.id(), v1.id()]);
    }

    #[test]
    fn identical_content_still_gets_distinct_versions() {
        let (store, doc) = seeded();
        let v1 = store.create_snapshot(&doc.id, &author(), "same").unwrap();
        let v2 = store.create_snapshot(&doc.id, &author(), "same").unwrap();
        assert_ne!(v1.id(), v2.id());
        assert_eq!(v1.meta.content_hash, v2.meta.content_hash);
    }

    #[test]
    fn snapshot_owns_a_copy_of_content() {
        let (store, doc) = seeded();
        let v1 = store.create_snapshot(&doc.id, &author(), "one").unwrap();
        retitle(&store, &doc.id, "Changed");
        let loaded = store.get_snapshot(&v1.id(), &doc.id).unwrap();
        assert_eq!(loaded.content.sections[0].subsections[0].title, "Intro");
    }

    #[test]
    fn history_is_restartable() {
        let (store, doc) = seeded();
        store.create_snapshot(&doc.id, &author(), "one").unwrap();
        store.create_snapshot(&doc.id, &author(), "two").unwrap();

        let mut iter = store.get_history(&doc.id).unwrap();
        assert_eq!(iter.by_ref().count(), 2);
        assert!(iter.next().is_none());
        iter.restart();
        assert_eq!(iter.count(), 2);
    }

    #[test]
    fn history_page_respects_limit() {
        let (store, doc) = seeded();
        for i in 0..5 {
            store.create_snapshot(&doc.id, &author(), &format!("v{i}")).unwrap();
        }
        let page = store.history_page(&doc.id, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].message, "v4");
        assert_eq!(page[1].message, "v3");
    }

    #[test]
    fn history_of_unsnapshotted_document_is_empty() {
        let (store, doc) = seeded();
        assert_eq!(store.get_history(&doc.id).unwrap().count(), 0);
        assert!(store.head(&doc.id).unwrap().is_none());
        assert!(store.head_snapshot(&doc.id).unwrap().is_none());
    }

    #[test]
    fn missing_document_is_reported() {
        let store = SnapshotStore::in_memory();
        let id = DocumentId::new();
        assert_eq!(
            store.create_snapshot(&id, &author(), "x").unwrap_err(),
            StoreError::DocumentNotFound(id)
        );
        assert!(matches!(
            store.get_history(&id),
            Err(StoreError::DocumentNotFound(_))
        ));
    }

    #[test]
    fn get_snapshot_checks_owning_document() {
        let (store, doc) = seeded();
        let v1 = store.create_snapshot(&doc.id, &author(), "one").unwrap();
        let other = DocumentId::new();
        assert_eq!(
            store.get_snapshot(&v1.id(), &other).unwrap_err(),
            StoreError::SnapshotNotFound(v1.id())
        );
        let unknown = VersionId::from_hash([3; 32]);
        assert_eq!(
            store.get_snapshot(&unknown, &doc.id).unwrap_err(),
            StoreError::SnapshotNotFound(unknown)
        );
    }

    #[test]
    fn head_returns_newest_meta() {
        let (store, doc) = seeded();
        store.create_snapshot(&doc.id, &author(), "one").unwrap();
        let v2 = store.create_snapshot(&doc.id, &author(), "two").unwrap();
        assert_eq!(store.head(&doc.id).unwrap(), Some(v2.meta.clone()));
        assert_eq!(store.head_snapshot(&doc.id).unwrap(), Some(v2));
    }

    #[test]
    fn append_restore_extends_chain_and_replaces_live() {
        let (store, doc) = seeded();
        let v1 = store.create_snapshot(&doc.id, &author(), "one").unwrap();
        retitle(&store, &doc.id, "Introduction");
        let v2 = store.create_snapshot(&doc.id, &author(), "two").unwrap();

        let v3 = store
            .append_restore(&doc.id, &v1, &author(), "restored")
            .unwrap();
        assert_eq!(v3.parent(), Some(v2.id()));
        assert_eq!(v3.meta.seq, 3);
        assert_eq!(v3.meta.kind, SnapshotKind::Restore { from: v1.id() });
        assert_eq!(v3.content, v1.content);
        assert_eq!(store.document(&doc.id).unwrap().content, v1.content);
        assert!(store.validate_chain(&doc.id).unwrap().is_valid());
    }

    #[test]
    fn append_restore_rejects_foreign_snapshot() {
        let (store, doc) = seeded();
        let v1 = store.create_snapshot(&doc.id, &author(), "one").unwrap();

        let other = Document::new(DocumentId::new(), doc.organization, DocumentContent::default());
        store.put_document(&other).unwrap();
        assert_eq!(
            store
                .append_restore(&other.id, &v1, &author(), "restored")
                .unwrap_err(),
            StoreError::SnapshotNotFound(v1.id())
        );
    }
}
