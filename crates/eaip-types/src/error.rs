use thiserror::Error;

/// Errors produced when parsing or converting foundation types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("unknown section type: {0}")]
    UnknownSectionType(String),

    #[error("duplicate section id: {0}")]
    DuplicateSectionId(String),

    #[error("duplicate subsection id {id} in section {section}")]
    DuplicateSubsectionId { section: String, id: String },
}
