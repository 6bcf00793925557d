use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eaip_types::{
    Actor, ContentHash, ContentHasher, DocumentContent, DocumentId, OrganizationId, Timestamp,
    VersionId,
};

use crate::error::StoreResult;

/// Why a snapshot was recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SnapshotKind {
    /// A committed edit of the live document.
    Edit,
    /// Live content was replaced with an earlier snapshot's content.
    Restore { from: VersionId },
}

impl SnapshotKind {
    pub fn is_restore(&self) -> bool {
        matches!(self, Self::Restore { .. })
    }
}

/// Snapshot header without content, as listed by history queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub id: VersionId,
    pub document: DocumentId,
    pub organization: OrganizationId,
    /// Predecessor in the chain; `None` for the first snapshot.
    pub parent: Option<VersionId>,
    /// 1-based position in the chain.
    pub seq: u64,
    pub content_hash: ContentHash,
    pub author: Actor,
    pub message: String,
    pub kind: SnapshotKind,
    pub timestamp: Timestamp,
}

/// Borrowed view of the fields a version id commits to.
#[derive(Serialize)]
struct VersionHeader<'a> {
    document: &'a DocumentId,
    organization: &'a OrganizationId,
    parent: Option<&'a VersionId>,
    seq: u64,
    content_hash: &'a ContentHash,
    author: &'a Actor,
    message: &'a str,
    kind: &'a SnapshotKind,
    timestamp: &'a Timestamp,
}

impl SnapshotMeta {
    /// Derive the version id from every other header field.
    pub fn compute_id(&self) -> StoreResult<VersionId> {
        let header = VersionHeader {
            document: &self.document,
            organization: &self.organization,
            parent: self.parent.as_ref(),
            seq: self.seq,
            content_hash: &self.content_hash,
            author: &self.author,
            message: &self.message,
            kind: &self.kind,
            timestamp: &self.timestamp,
        };
        Ok(VersionId::from_hash(
            ContentHasher::VERSION.hash_json(&header)?,
        ))
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.timestamp.to_datetime()
    }

    pub fn is_first(&self) -> bool {
        self.parent.is_none()
    }
}

/// The full, immutable state of a document at one point in its history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub meta: SnapshotMeta,
    pub content: DocumentContent,
}

impl Snapshot {
    pub fn id(&self) -> VersionId {
        self.meta.id
    }

    pub fn document(&self) -> DocumentId {
        self.meta.document
    }

    pub fn parent(&self) -> Option<VersionId> {
        self.meta.parent
    }
}

/// A snapshot as the persistence collaborator stores it: the header plus the
/// canonical encoded content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotRecord {
    pub meta: SnapshotMeta,
    pub payload: Vec<u8>,
}

impl SnapshotRecord {
    pub fn id(&self) -> VersionId {
        self.meta.id
    }
}
