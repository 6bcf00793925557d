//! Foundation types for eAIP document version history.
//!
//! Every other `eaip-*` crate depends on this one. It defines the identity
//! types used to address documents and versions, the domain-separated
//! content hasher that derives version identifiers, the history clock, and
//! the tree-shaped document model (sections → subsections → rich text).
//!
//! # Key Types
//!
//! - [`VersionId`] / [`ContentHash`] -- BLAKE3 digests, hex encoded on the wire
//! - [`DocumentId`], [`OrganizationId`], [`ActorId`] -- UUID v7 identifiers
//! - [`Actor`] -- attribution supplied by the identity collaborator
//! - [`Timestamp`] -- hybrid logical timestamp, strictly increasing per chain
//! - [`Document`], [`DocumentContent`], [`Section`], [`Subsection`] -- the versioned tree

pub mod actor;
pub mod document;
pub mod error;
pub mod hash;
pub mod ids;
pub mod temporal;
pub mod version;

pub use actor::Actor;
pub use document::{
    Document, DocumentContent, DocumentMetadata, DocumentStatus, Image, Section, SectionType,
    Subsection,
};
pub use error::TypeError;
pub use hash::{ContentHasher, HasherError};
pub use ids::{ActorId, DocumentId, OrganizationId};
pub use temporal::Timestamp;
pub use version::{ContentHash, VersionId};
