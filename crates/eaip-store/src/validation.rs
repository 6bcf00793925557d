use serde::Serialize;

use eaip_types::{DocumentId, Timestamp, VersionId};

use crate::codec;
use crate::error::StoreResult;
use crate::traits::SnapshotPersistence;

/// Result of validating one document's chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    pub document: DocumentId,
    pub snapshot_count: u64,
    pub links_valid: bool,
    pub sequence_monotonic: bool,
    pub hashes_valid: bool,
    pub timestamps_monotonic: bool,
    pub head_matches: bool,
    pub violations: Vec<Violation>,
}

impl ChainReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub seq: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    SequenceGap,
    BrokenLink,
    ForeignSnapshot,
    VersionIdMismatch,
    ContentHashMismatch,
    UndecodableContent,
    TimestampRegression,
    HeadMismatch,
}

/// Chain integrity validator.
pub struct ChainValidator;

impl ChainValidator {
    /// Check linearity, sequence numbering, predecessor links, recomputed
    /// version ids and content hashes, timestamp order and the head pointer.
    pub fn validate(
        persistence: &dyn SnapshotPersistence,
        document: &DocumentId,
    ) -> StoreResult<ChainReport> {
        let records = persistence.read_chain(document)?;
        let head = persistence.read_head(document)?;

        let mut report = ChainReport {
            document: *document,
            snapshot_count: records.len() as u64,
            links_valid: true,
            sequence_monotonic: true,
            hashes_valid: true,
            timestamps_monotonic: true,
            head_matches: true,
            violations: Vec::new(),
        };

        let mut previous: Option<(VersionId, Timestamp)> = None;
        for (index, record) in records.iter().enumerate() {
            let meta = &record.meta;
            let expected_seq = (index + 1) as u64;
            if meta.seq != expected_seq {
                report.sequence_monotonic = false;
                report.push(meta.seq, ViolationKind::SequenceGap, format!(
                    "expected seq {expected_seq}, got {}",
                    meta.seq
                ));
            }

            if meta.document != *document {
                report.links_valid = false;
                report.push(
                    meta.seq,
                    ViolationKind::ForeignSnapshot,
                    format!("snapshot belongs to document {}", meta.document),
                );
            }

            if meta.parent != previous.map(|(id, _)| id) {
                report.links_valid = false;
                report.push(meta.seq, ViolationKind::BrokenLink, "predecessor link mismatch".into());
            }

            if let Ok(computed) = meta.compute_id() {
                if computed != meta.id {
                    report.hashes_valid = false;
                    report.push(
                        meta.seq,
                        ViolationKind::VersionIdMismatch,
                        "version id does not match computed header hash".into(),
                    );
                }
            }

            if codec::content_hash(&record.payload) != meta.content_hash {
                report.hashes_valid = false;
                report.push(
                    meta.seq,
                    ViolationKind::ContentHashMismatch,
                    "content hash does not match payload".into(),
                );
            }

            if let Err(err) = codec::decode(&record.payload) {
                report.hashes_valid = false;
                report.push(meta.seq, ViolationKind::UndecodableContent, err.to_string());
            }

            if let Some((_, prev_ts)) = previous {
                if meta.timestamp <= prev_ts {
                    report.timestamps_monotonic = false;
                    report.push(
                        meta.seq,
                        ViolationKind::TimestampRegression,
                        format!("timestamp {} is not after {prev_ts}", meta.timestamp),
                    );
                }
            }

            previous = Some((meta.id, meta.timestamp));
        }

        if head != previous.map(|(id, _)| id) {
            report.head_matches = false;
            report.push(
                report.snapshot_count,
                ViolationKind::HeadMismatch,
                "head does not point at the newest snapshot".into(),
            );
        }

        Ok(report)
    }

    /// Validate the chains of every document the persistence holds.
    pub fn validate_all(persistence: &dyn SnapshotPersistence) -> StoreResult<Vec<ChainReport>> {
        persistence
            .documents()?
            .iter()
            .map(|id| Self::validate(persistence, id))
            .collect()
    }
}

impl ChainReport {
    fn push(&mut self, seq: u64, kind: ViolationKind, description: String) {
        self.violations.push(Violation {
            seq,
            kind,
            description,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use eaip_types::{
        Actor, Document, DocumentContent, DocumentMetadata, OrganizationId, Section, SectionType,
    };

    use super::*;
    use crate::memory::InMemorySnapshotPersistence;
    use crate::store::SnapshotStore;

    fn setup(snapshots: usize) -> (Arc<InMemorySnapshotPersistence>, SnapshotStore, DocumentId) {
        let persistence = Arc::new(InMemorySnapshotPersistence::new());
        let store = SnapshotStore::new(persistence.clone());
        let doc = Document::new(
            DocumentId::new(),
            OrganizationId::new(),
            DocumentContent::new(DocumentMetadata::new("eAIP", "LT")),
        );
        store.put_document(&doc).unwrap();
        for i in 0..snapshots {
            let mut live = store.document(&doc.id).unwrap();
            live.content = live
                .content
                .with_section(Section::new(format!("s{i}"), SectionType::Gen, "General", i as u32));
            store.put_document(&live).unwrap();
            store
                .create_snapshot(&doc.id, &Actor::system(), &format!("edit {i}"))
                .unwrap();
        }
        (persistence, store, doc.id)
    }

    #[test]
    fn valid_chain_passes() {
        let (persistence, _, doc) = setup(3);
        let report = ChainValidator::validate(persistence.as_ref(), &doc).unwrap();
        assert!(report.is_valid(), "{:?}", report.violations);
        assert_eq!(report.snapshot_count, 3);
    }

    #[test]
    fn empty_chain_is_valid() {
        let (persistence, _, doc) = setup(0);
        let report = ChainValidator::validate(persistence.as_ref(), &doc).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.snapshot_count, 0);
    }

    #[test]
    fn tampered_payload_is_flagged() {
        let (persistence, _, doc) = setup(2);
        let mut record = persistence.read_chain(&doc).unwrap()[0].clone();
        record.payload = codec::encode(&DocumentContent::default()).unwrap();
        persistence.tamper(record);

        let report = ChainValidator::validate(persistence.as_ref(), &doc).unwrap();
        assert!(!report.hashes_valid);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::ContentHashMismatch);
        assert_eq!(report.violations[0].seq, 1);
    }

    #[test]
    fn tampered_message_is_flagged() {
        let (persistence, _, doc) = setup(2);
        let mut record = persistence.read_chain(&doc).unwrap()[1].clone();
        record.meta.message = "rewritten".into();
        persistence.tamper(record);

        let report = ChainValidator::validate(persistence.as_ref(), &doc).unwrap();
        assert!(report
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::VersionIdMismatch && v.seq == 2));
    }

    #[test]
    fn validate_all_covers_every_document() {
        let (persistence, store, _) = setup(1);
        let other = Document::new(DocumentId::new(), OrganizationId::new(), DocumentContent::default());
        store.put_document(&other).unwrap();
        store.create_snapshot(&other.id, &Actor::system(), "first").unwrap();

        let reports = ChainValidator::validate_all(persistence.as_ref()).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(ChainReport::is_valid));
    }

    #[test]
    fn report_serializes_violation_kinds() {
        let violation = Violation {
            seq: 4,
            kind: ViolationKind::BrokenLink,
            description: "x".into(),
        };
        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["kind"], "broken_link");
    }
}
