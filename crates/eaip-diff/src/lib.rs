//! Diff engine for eAIP document snapshots.
//!
//! Computes structural change sets between two states of a document:
//! sections and subsections matched by stable id, with content, metadata,
//! ordering and image differences classified separately.
//!
//! # Key Types
//!
//! - [`ChangeSet`] / [`Change`] / [`ChangeSummary`] -- ordered change list plus tallies
//! - [`compare`] / [`compare_contents`] -- pure comparison of snapshots or content trees
//! - [`DiffEngine`] -- store-backed comparisons (versions, previous, live)
//! - [`ChangeSetCache`] / [`InMemoryChangeSetCache`] -- write-if-absent result cache
//! - [`text`] -- rich-text plain-text extraction and word tallies

pub mod cache;
pub mod change;
pub mod compare;
pub mod engine;
pub mod error;
pub mod text;

pub use cache::{CacheKey, ChangeSetCache, InMemoryChangeSetCache};
pub use change::{Change, ChangeAction, ChangeSet, ChangeSummary, ChangeType};
pub use compare::{compare, compare_contents, diff_contents};
pub use engine::DiffEngine;
pub use error::{DiffError, DiffResult};
pub use text::{plain_text, word_tally, WordTally};
