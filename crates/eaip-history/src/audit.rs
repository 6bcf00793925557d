//! The audit collaborator boundary.
//!
//! History operations report what they did to an [`AuditSink`]. Delivery is
//! fire-and-forget: a failing sink is logged and never fails the operation
//! that produced the event.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use eaip_types::{Actor, DocumentId, OrganizationId, VersionId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    SnapshotCreated,
    VersionRestored,
    VersionAccessed,
    VersionsCompared,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SnapshotCreated => "snapshot_created",
            Self::VersionRestored => "version_restored",
            Self::VersionAccessed => "version_accessed",
            Self::VersionsCompared => "versions_compared",
        }
    }
}

/// One reportable action on a document's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub document: DocumentId,
    pub organization: OrganizationId,
    pub actor: Actor,
    pub action: AuditAction,
    /// The snapshot the action produced or read. For a comparison this is
    /// the `from` side.
    pub version: VersionId,
    pub details: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        document: DocumentId,
        organization: OrganizationId,
        actor: Actor,
        action: AuditAction,
        version: VersionId,
    ) -> Self {
        Self {
            document,
            organization,
            actor,
            action,
            version,
            details: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("audit delivery failed: {0}")]
pub struct AuditError(pub String);

/// Receiver of audit events.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError>;
}

/// Hand an event to `sink`, logging rather than propagating a failure.
pub fn deliver(sink: &dyn AuditSink, event: &AuditEvent) {
    if let Err(err) = sink.record(event) {
        warn!(
            document = %event.document,
            action = event.action.as_str(),
            error = %err,
            "audit sink rejected event"
        );
    }
}

/// Emits each event as a structured `tracing` record.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        info!(
            target: "eaip::audit",
            document = %event.document,
            organization = %event.organization,
            actor = %event.actor.id,
            action = event.action.as_str(),
            version = %event.version.short_hex(),
            "audit"
        );
        Ok(())
    }
}

/// Collects events in memory.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every event recorded so far, oldest first.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        self.events
            .lock()
            .map_err(|_| AuditError("memory sink lock poisoned".into()))?
            .push(event.clone());
        Ok(())
    }
}

/// Discards every event.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &AuditEvent) -> Result<(), AuditError> {
        Ok(())
    }
}
