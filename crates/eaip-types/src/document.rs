//! The versioned document tree.
//!
//! A [`Document`] is the mutable live entity; its [`DocumentContent`] is the
//! part that gets snapshotted. Sections and subsections carry stable string
//! identifiers so that the diff engine can match them across versions even
//! when codes, titles or order indices change.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;
use crate::ids::{ActorId, DocumentId, OrganizationId};
use crate::version::VersionId;

/// Part of an eAIP publication a section belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionType {
    /// General.
    #[serde(rename = "GEN")]
    Gen,
    /// En-route.
    #[serde(rename = "ENR")]
    Enr,
    /// Aerodromes.
    #[serde(rename = "AD")]
    Ad,
}

impl SectionType {
    pub const ALL: [SectionType; 3] = [SectionType::Gen, SectionType::Enr, SectionType::Ad];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gen => "GEN",
            Self::Enr => "ENR",
            Self::Ad => "AD",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GEN" => Ok(Self::Gen),
            "ENR" => Ok(Self::Enr),
            "AD" => Ok(Self::Ad),
            other => Err(TypeError::UnknownSectionType(other.to_string())),
        }
    }
}

/// Publication workflow state of a document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Review,
    Approved,
    Published,
    Archived,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Review => "review",
            Self::Approved => "approved",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image embedded in a subsection. The bytes live with the file-storage
/// collaborator; only the reference is versioned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub url: String,
    pub size: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: Option<ActorId>,
}

/// A numbered part of a section, e.g. `GEN 1.1`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subsection {
    pub id: String,
    /// Human-facing numbering such as `"1.1"`.
    pub code: String,
    pub title: String,
    pub order: u32,
    /// Rich-text tree in the editor's JSON node format. Opaque to the engine
    /// apart from deep equality and plain-text extraction.
    pub content: Value,
    #[serde(default)]
    pub images: Vec<Image>,
    pub last_modified: DateTime<Utc>,
    pub modified_by: Option<ActorId>,
}

impl Subsection {
    /// A subsection holding an empty rich-text document.
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        title: impl Into<String>,
        order: u32,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            title: title.into(),
            order,
            content: serde_json::json!({ "type": "doc", "content": [] }),
            images: Vec::new(),
            last_modified: Utc::now(),
            modified_by: None,
        }
    }

    /// Replace the content with a single paragraph of plain text.
    pub fn with_text(mut self, text: &str) -> Self {
        self.content = serde_json::json!({
            "type": "doc",
            "content": [{
                "type": "paragraph",
                "content": [{ "type": "text", "text": text }]
            }]
        });
        self
    }

    pub fn with_content(mut self, content: Value) -> Self {
        self.content = content;
        self
    }

    pub fn with_image(mut self, image: Image) -> Self {
        self.images.push(image);
        self
    }
}

/// A top-level part of the publication (GEN, ENR or AD).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    pub title: String,
    pub order: u32,
    #[serde(default)]
    pub subsections: Vec<Subsection>,
}

impl Section {
    pub fn new(
        id: impl Into<String>,
        section_type: SectionType,
        title: impl Into<String>,
        order: u32,
    ) -> Self {
        Self {
            id: id.into(),
            section_type,
            title: title.into(),
            order,
            subsections: Vec::new(),
        }
    }

    pub fn with_subsection(mut self, subsection: Subsection) -> Self {
        self.subsections.push(subsection);
        self
    }

    pub fn subsection(&self, id: &str) -> Option<&Subsection> {
        self.subsections.iter().find(|s| s.id == id)
    }

    pub fn subsection_mut(&mut self, id: &str) -> Option<&mut Subsection> {
        self.subsections.iter_mut().find(|s| s.id == id)
    }
}

/// Document-level fields that are versioned alongside the section tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    /// ICAO country code, e.g. `"LT"`.
    pub country: String,
    pub airport: Option<String>,
    pub status: DocumentStatus,
    pub airac_cycle: Option<String>,
    /// Free-form properties (language, authority, contact, ...).
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl DocumentMetadata {
    pub fn new(title: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            country: country.into(),
            ..Self::default()
        }
    }
}

/// The snapshotted state of a document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentContent {
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl DocumentContent {
    pub fn new(metadata: DocumentMetadata) -> Self {
        Self {
            metadata,
            sections: Vec::new(),
        }
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn section_mut(&mut self, id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    /// Look up a subsection anywhere in the tree by id.
    pub fn find_subsection(&self, id: &str) -> Option<(&Section, &Subsection)> {
        self.sections
            .iter()
            .find_map(|section| section.subsection(id).map(|sub| (section, sub)))
    }

    pub fn subsection_count(&self) -> usize {
        self.sections.iter().map(|s| s.subsections.len()).sum()
    }

    /// Section ids must be unique in the document, subsection ids unique
    /// within their section. Comparison matches items by these ids.
    pub fn check_ids(&self) -> Result<(), TypeError> {
        let mut sections = HashSet::with_capacity(self.sections.len());
        for section in &self.sections {
            if !sections.insert(section.id.as_str()) {
                return Err(TypeError::DuplicateSectionId(section.id.clone()));
            }
            let mut subsections = HashSet::with_capacity(section.subsections.len());
            for sub in &section.subsections {
                if !subsections.insert(sub.id.as_str()) {
                    return Err(TypeError::DuplicateSubsectionId {
                        section: section.id.clone(),
                        id: sub.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// The live, mutable document as held by the persistence collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub organization: OrganizationId,
    pub content: DocumentContent,
    /// Newest snapshot, `None` until the first snapshot is taken.
    pub head: Option<VersionId>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<ActorId>,
}

impl Document {
    pub fn new(id: DocumentId, organization: OrganizationId, content: DocumentContent) -> Self {
        Self {
            id,
            organization,
            content,
            head: None,
            updated_at: Utc::now(),
            updated_by: None,
        }
    }
}
