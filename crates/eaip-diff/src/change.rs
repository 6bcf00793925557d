//! The change model: what a comparison of two document states reports.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use eaip_types::{ContentHasher, DocumentId, SectionType, VersionId};

/// Granularity of a change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Section,
    Subsection,
    Content,
    Metadata,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Subsection => "subsection",
            Self::Content => "content",
            Self::Metadata => "metadata",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Added,
    Removed,
    Modified,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
        }
    }

    /// The action seen from the opposite direction of comparison.
    pub fn inverse(&self) -> Self {
        match self {
            Self::Added => Self::Removed,
            Self::Removed => Self::Added,
            Self::Modified => Self::Modified,
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified difference between two document states.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// Synthetic id, derived from the record's position and identity.
    pub id: String,
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    pub action: ChangeAction,
    /// Location such as `GEN/1.1/title`.
    pub path: String,
    pub section_type: Option<SectionType>,
    pub section_code: Option<String>,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub description: String,
}

impl Change {
    pub(crate) fn new(
        change_type: ChangeType,
        action: ChangeAction,
        path: String,
        description: String,
    ) -> Self {
        Self {
            id: String::new(),
            change_type,
            action,
            path,
            section_type: None,
            section_code: None,
            old_value: None,
            new_value: None,
            description,
        }
    }

    pub(crate) fn in_section(mut self, section_type: SectionType) -> Self {
        self.section_type = Some(section_type);
        self
    }

    pub(crate) fn at_code(mut self, code: &str) -> Self {
        self.section_code = Some(code.to_string());
        self
    }

    pub(crate) fn values(mut self, old: Option<Value>, new: Option<Value>) -> Self {
        self.old_value = old;
        self.new_value = new;
        self
    }
}

/// Derive the synthetic id of the change at `index`.
pub(crate) fn change_id(index: usize, change: &Change) -> String {
    let key = format!(
        "{index}:{}:{}:{}",
        change.change_type, change.action, change.path
    );
    let digest = ContentHasher::CHANGE.hash(key.as_bytes());
    format!("chg-{}", hex::encode(&digest[..6]))
}

/// Counts over a change list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub sections_added: usize,
    pub sections_removed: usize,
    pub sections_modified: usize,
    pub subsections_added: usize,
    pub subsections_removed: usize,
    pub subsections_modified: usize,
    pub content_modified: usize,
    pub metadata_modified: usize,
}

impl ChangeSummary {
    /// Tally a change list. Every change increments exactly one counter.
    pub fn tally(changes: &[Change]) -> Self {
        let mut summary = Self::default();
        for change in changes {
            let counter = match (change.change_type, change.action) {
                (ChangeType::Section, ChangeAction::Added) => &mut summary.sections_added,
                (ChangeType::Section, ChangeAction::Removed) => &mut summary.sections_removed,
                (ChangeType::Section, ChangeAction::Modified) => &mut summary.sections_modified,
                (ChangeType::Subsection, ChangeAction::Added) => &mut summary.subsections_added,
                (ChangeType::Subsection, ChangeAction::Removed) => &mut summary.subsections_removed,
                (ChangeType::Subsection, ChangeAction::Modified) => {
                    &mut summary.subsections_modified
                }
                (ChangeType::Content, _) => &mut summary.content_modified,
                (ChangeType::Metadata, _) => &mut summary.metadata_modified,
            };
            *counter += 1;
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.sections_added
            + self.sections_removed
            + self.sections_modified
            + self.subsections_added
            + self.subsections_removed
            + self.subsections_modified
            + self.content_modified
            + self.metadata_modified
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// The result of comparing two states of one document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub document: DocumentId,
    /// Source version, `None` when the source is not a snapshot.
    pub from: Option<VersionId>,
    /// Destination version, `None` for the live document.
    pub to: Option<VersionId>,
    pub changes: Vec<Change>,
    pub summary: ChangeSummary,
}

impl ChangeSet {
    /// Assemble a change set, assigning change ids and tallying the summary.
    pub fn new(
        document: DocumentId,
        from: Option<VersionId>,
        to: Option<VersionId>,
        mut changes: Vec<Change>,
    ) -> Self {
        for (index, change) in changes.iter_mut().enumerate() {
            change.id = change_id(index, change);
        }
        let summary = ChangeSummary::tally(&changes);
        Self {
            document,
            from,
            to,
            changes,
            summary,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}
