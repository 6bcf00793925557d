use std::sync::Arc;

use tracing::info;

use eaip_store::{Snapshot, SnapshotStore};
use eaip_types::{Actor, DocumentId, VersionId};

use crate::audit::{deliver, AuditAction, AuditEvent, AuditSink};
use crate::error::HistoryResult;
use crate::retry::retry_on_conflict;

/// Makes a past snapshot's content live again.
///
/// A restore never rewinds the chain: it appends a new head snapshot whose
/// content equals the target's, and replaces the live content in the same
/// transactional persistence call.
#[derive(Clone)]
pub struct RestoreCoordinator {
    store: SnapshotStore,
    audit: Arc<dyn AuditSink>,
    max_attempts: u32,
}

impl RestoreCoordinator {
    pub fn new(store: SnapshotStore, audit: Arc<dyn AuditSink>, max_attempts: u32) -> Self {
        Self {
            store,
            audit,
            max_attempts,
        }
    }

    /// Restore `version` of `document` on behalf of `actor`.
    pub fn restore(
        &self,
        document: &DocumentId,
        version: &VersionId,
        actor: &Actor,
    ) -> HistoryResult<Snapshot> {
        let target = self.store.get_snapshot(version, document)?;
        let message = restore_message(version);

        let restored = retry_on_conflict(document, self.max_attempts, || {
            self.store.append_restore(document, &target, actor, &message)
        })?;

        info!(
            document = %document,
            from = %version.short_hex(),
            version = %restored.id().short_hex(),
            actor = %actor.id,
            "document restored"
        );

        let event = AuditEvent::new(
            *document,
            restored.meta.organization,
            actor.clone(),
            AuditAction::VersionRestored,
            restored.id(),
        )
        .with_detail("restored_from", version.to_hex())
        .with_detail("message", message);
        deliver(self.audit.as_ref(), &event);

        Ok(restored)
    }
}

/// Message recorded on the snapshot a restore produces.
pub fn restore_message(version: &VersionId) -> String {
    format!("restored from version {}", version.short_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditError, MemoryAuditSink};
    use crate::error::HistoryError;
    use eaip_store::SnapshotKind;
    use eaip_types::{
        ActorId, Document, DocumentContent, DocumentMetadata, OrganizationId, Section,
        SectionType, Subsection,
    };

    struct FailingSink;

    impl AuditSink for FailingSink {
        fn record(&self, _event: &AuditEvent) -> Result<(), AuditError> {
            Err(AuditError("collector offline".into()))
        }
    }

    fn actor() -> Actor {
        Actor::new(ActorId::new(), "Reviewer", "reviewer@example.org")
    }

    fn seeded(store: &SnapshotStore) -> Document {
        let content = DocumentContent::new(DocumentMetadata::new("eAIP", "LT")).with_section(
            Section::new("s-gen", SectionType::Gen, "General", 0)
                .with_subsection(Subsection::new("g1", "1.1", "Intro", 0)),
        );
        let doc = Document::new(DocumentId::new(), OrganizationId::new(), content);
        store.put_document(&doc).unwrap();
        doc
    }

    #[test]
    fn restore_appends_and_audits() {
        let store = SnapshotStore::in_memory();
        let sink = Arc::new(MemoryAuditSink::new());
        let coordinator = RestoreCoordinator::new(store.clone(), sink.clone(), 3);
        let doc = seeded(&store);

        let v1 = store.create_snapshot(&doc.id, &actor(), "one").unwrap();
        let mut live = store.document(&doc.id).unwrap();
        live.content.sections[0].title = "Changed".into();
        store.put_document(&live).unwrap();
        let v2 = store.create_snapshot(&doc.id, &actor(), "two").unwrap();

        let v3 = coordinator.restore(&doc.id, &v1.id(), &actor()).unwrap();
        assert_eq!(v3.parent(), Some(v2.id()));
        assert_eq!(v3.content, v1.content);
        assert_eq!(v3.meta.kind, SnapshotKind::Restore { from: v1.id() });
        assert_eq!(v3.meta.message, format!("restored from version {}", v1.id().short_hex()));

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::VersionRestored);
        assert_eq!(events[0].version, v3.id());
        assert_eq!(events[0].details["restored_from"], v1.id().to_hex());
    }

    #[test]
    fn unknown_version_is_not_found() {
        let store = SnapshotStore::in_memory();
        let coordinator = RestoreCoordinator::new(store.clone(), Arc::new(MemoryAuditSink::new()), 3);
        let doc = seeded(&store);
        let missing = VersionId::from_hash([8; 32]);
        assert_eq!(
            coordinator.restore(&doc.id, &missing, &actor()).unwrap_err(),
            HistoryError::SnapshotNotFound(missing)
        );
    }

    #[test]
    fn audit_failure_does_not_fail_restore() {
        let store = SnapshotStore::in_memory();
        let coordinator = RestoreCoordinator::new(store.clone(), Arc::new(FailingSink), 3);
        let doc = seeded(&store);
        let v1 = store.create_snapshot(&doc.id, &actor(), "one").unwrap();

        let restored = coordinator.restore(&doc.id, &v1.id(), &actor()).unwrap();
        assert_eq!(store.head(&doc.id).unwrap().map(|m| m.id), Some(restored.id()));
    }
}
