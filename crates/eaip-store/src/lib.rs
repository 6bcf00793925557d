//! Snapshot Store for eAIP document version history.
//!
//! Every committed edit of a live document is captured as an immutable
//! [`Snapshot`]: a full owned copy of the document content, linked to its
//! predecessor, identified by a [`VersionId`](eaip_types::VersionId) derived
//! from its header. The snapshots of one document form a strict linear chain
//! whose newest entry is the document's head.
//!
//! # Components
//!
//! - [`SnapshotPersistence`] -- storage boundary with conditional (CAS) appends
//! - [`InMemorySnapshotPersistence`] -- `RwLock`-guarded backend for tests and embedding
//! - [`SnapshotStore`] -- create snapshots, walk history, load snapshots
//! - [`HistoryIter`] -- lazy newest-first walk over predecessor links
//! - [`ChainValidator`] -- linearity, sequence, link and hash checks
//! - [`codec`] -- canonical JSON encoding with a round-trip check
//!
//! # Design Rules
//!
//! 1. Snapshots are never mutated or deleted.
//! 2. The head only moves through a compare-and-swap against the head the
//!    snapshot was built on.
//! 3. Restore replaces live content and appends in one transactional step.
//! 4. Persistence errors are propagated, never swallowed.

pub mod codec;
pub mod error;
pub mod history;
pub mod memory;
pub mod snapshot;
pub mod store;
pub mod traits;
pub mod validation;

pub use error::{StoreError, StoreResult};
pub use history::HistoryIter;
pub use memory::InMemorySnapshotPersistence;
pub use snapshot::{Snapshot, SnapshotKind, SnapshotMeta, SnapshotRecord};
pub use store::SnapshotStore;
pub use traits::SnapshotPersistence;
pub use validation::{ChainReport, ChainValidator, Violation, ViolationKind};
