//! Structural comparison of two document states.
//!
//! Sections are matched by id, then subsections within each matched section
//! by id. Unmatched items are reported as added or removed; matched items
//! are compared field by field, each differing field yielding its own
//! change. Output follows document order: document metadata first, then
//! sections by order index (destination order for matched and added items,
//! source order for removed ones, removals before additions on ties, then
//! id), and the same rule for subsections within a section.
//!
//! Where the two sides disagree on a path component (a section's type, a
//! subsection's code) the lexicographically lower value is used, so the
//! paths reported by `compare(a, b)` and `compare(b, a)` coincide.

use std::collections::HashMap;

use serde_json::{json, Value};

use eaip_types::{
    DocumentContent, DocumentId, DocumentMetadata, Image, Section, SectionType, Subsection,
};
use eaip_store::Snapshot;

use crate::change::{Change, ChangeAction, ChangeSet, ChangeType};
use crate::error::{DiffError, DiffResult};
use crate::text::describe_content_change;

/// Compare two snapshots of the same document.
///
/// Fails with [`DiffError::DocumentMismatch`] before doing any work if the
/// snapshots belong to different documents.
pub fn compare(from: &Snapshot, to: &Snapshot) -> DiffResult<ChangeSet> {
    if from.document() != to.document() {
        return Err(DiffError::DocumentMismatch {
            left: from.document(),
            right: to.document(),
        });
    }
    Ok(ChangeSet::new(
        from.document(),
        Some(from.id()),
        Some(to.id()),
        diff_contents(&from.content, &to.content),
    ))
}

/// Compare two content trees that are not necessarily snapshots (a snapshot
/// against the live document, or two files).
pub fn compare_contents(
    document: DocumentId,
    from: &DocumentContent,
    to: &DocumentContent,
) -> ChangeSet {
    ChangeSet::new(document, None, None, diff_contents(from, to))
}

/// The ordered change list between two content trees.
pub fn diff_contents(from: &DocumentContent, to: &DocumentContent) -> Vec<Change> {
    let mut changes = Vec::new();
    diff_metadata(&from.metadata, &to.metadata, &mut changes);

    for pair in pair_by_id(&from.sections, &to.sections, |s| &s.id, |s| s.order) {
        match pair {
            Paired::Removed(section) => changes.push(section_presence(section, ChangeAction::Removed)),
            Paired::Added(section) => changes.push(section_presence(section, ChangeAction::Added)),
            Paired::Both(old, new) => diff_section(old, new, &mut changes),
        }
    }
    changes
}

/// One item's fate across the two sides.
enum Paired<'a, T> {
    Removed(&'a T),
    Added(&'a T),
    Both(&'a T, &'a T),
}

/// Match items by id and sort them into document order.
///
/// Ids are unique per level (`DocumentContent::check_ids`, enforced by the
/// store on every write and snapshot); a repeated id would shadow the later
/// item.
fn pair_by_id<'a, T>(
    old: &'a [T],
    new: &'a [T],
    id: impl Fn(&T) -> &String,
    order: impl Fn(&T) -> u32,
) -> Vec<Paired<'a, T>> {
    let mut old_by_id: HashMap<&str, &T> = HashMap::with_capacity(old.len());
    for item in old {
        old_by_id.entry(id(item).as_str()).or_insert(item);
    }
    let mut new_by_id: HashMap<&str, &T> = HashMap::with_capacity(new.len());
    for item in new {
        new_by_id.entry(id(item).as_str()).or_insert(item);
    }

    let mut keyed: Vec<((u32, u8, &str), Paired<'a, T>)> = Vec::new();
    for (&key, &item) in &old_by_id {
        if !new_by_id.contains_key(key) {
            keyed.push(((order(item), 0, key), Paired::Removed(item)));
        }
    }
    for (&key, &item) in &new_by_id {
        let paired = match old_by_id.get(key) {
            Some(&previous) => Paired::Both(previous, item),
            None => Paired::Added(item),
        };
        keyed.push(((order(item), 1, key), paired));
    }

    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, paired)| paired).collect()
}

fn lower<'a>(a: &'a str, b: &'a str) -> &'a str {
    if a <= b {
        a
    } else {
        b
    }
}

fn anchor_type(old: &Section, new: &Section) -> SectionType {
    if old.section_type.as_str() <= new.section_type.as_str() {
        old.section_type
    } else {
        new.section_type
    }
}

fn diff_metadata(old: &DocumentMetadata, new: &DocumentMetadata, changes: &mut Vec<Change>) {
    let mut field = |name: &str, label: &str, before: Value, after: Value| {
        if before != after {
            changes.push(
                Change::new(
                    ChangeType::Metadata,
                    ChangeAction::Modified,
                    format!("metadata/{name}"),
                    format!("Document {label} changed from {before} to {after}"),
                )
                .values(Some(before), Some(after)),
            );
        }
    };
    field("title", "title", json!(old.title), json!(new.title));
    field("country", "country", json!(old.country), json!(new.country));
    field("airport", "airport", json!(old.airport), json!(new.airport));
    field("status", "status", json!(old.status), json!(new.status));
    field("airac_cycle", "AIRAC cycle", json!(old.airac_cycle), json!(new.airac_cycle));

    let mut keys: Vec<&String> = old.properties.keys().chain(new.properties.keys()).collect();
    keys.sort();
    keys.dedup();
    for key in keys {
        let before = old.properties.get(key);
        let after = new.properties.get(key);
        if before == after {
            continue;
        }
        let description = match (before, after) {
            (None, _) => format!("Document property {key} set"),
            (_, None) => format!("Document property {key} cleared"),
            _ => format!("Document property {key} changed"),
        };
        changes.push(
            Change::new(
                ChangeType::Metadata,
                ChangeAction::Modified,
                format!("metadata/properties.{key}"),
                description,
            )
            .values(before.cloned(), after.cloned()),
        );
    }
}

fn section_presence(section: &Section, action: ChangeAction) -> Change {
    let summary = json!({
        "id": section.id,
        "type": section.section_type,
        "title": section.title,
        "subsections": section.subsections.len(),
    });
    let (old, new) = match action {
        ChangeAction::Removed => (Some(summary), None),
        _ => (None, Some(summary)),
    };
    Change::new(
        ChangeType::Section,
        action,
        section.section_type.as_str().to_string(),
        format!("Section {} \"{}\" {action}", section.section_type, section.title),
    )
    .in_section(section.section_type)
    .values(old, new)
}

fn diff_section(old: &Section, new: &Section, changes: &mut Vec<Change>) {
    let anchor = anchor_type(old, new);

    if old.section_type != new.section_type {
        changes.push(
            Change::new(
                ChangeType::Section,
                ChangeAction::Modified,
                format!("{anchor}/type"),
                format!(
                    "Section type changed from {} to {}",
                    old.section_type, new.section_type
                ),
            )
            .in_section(anchor)
            .values(Some(json!(old.section_type)), Some(json!(new.section_type))),
        );
    }

    if old.order != new.order {
        changes.push(
            Change::new(
                ChangeType::Section,
                ChangeAction::Modified,
                format!("{anchor}/order"),
                format!(
                    "Section {anchor} moved from position {} to {}",
                    old.order, new.order
                ),
            )
            .in_section(anchor)
            .values(Some(json!(old.order)), Some(json!(new.order))),
        );
    }

    if old.title != new.title {
        changes.push(
            Change::new(
                ChangeType::Metadata,
                ChangeAction::Modified,
                format!("{anchor}/title"),
                format!(
                    "Section {anchor} title changed from \"{}\" to \"{}\"",
                    old.title, new.title
                ),
            )
            .in_section(anchor)
            .values(Some(json!(old.title)), Some(json!(new.title))),
        );
    }

    for pair in pair_by_id(&old.subsections, &new.subsections, |s| &s.id, |s| s.order) {
        match pair {
            Paired::Removed(sub) => {
                changes.push(subsection_presence(anchor, sub, ChangeAction::Removed))
            }
            Paired::Added(sub) => changes.push(subsection_presence(anchor, sub, ChangeAction::Added)),
            Paired::Both(before, after) => diff_subsection(anchor, before, after, changes),
        }
    }
}

fn subsection_presence(anchor: SectionType, sub: &Subsection, action: ChangeAction) -> Change {
    let summary = json!({
        "id": sub.id,
        "code": sub.code,
        "title": sub.title,
        "content": sub.content,
    });
    let (old, new) = match action {
        ChangeAction::Removed => (Some(summary), None),
        _ => (None, Some(summary)),
    };
    Change::new(
        ChangeType::Subsection,
        action,
        format!("{anchor}/{}", sub.code),
        format!("Subsection {anchor} {} \"{}\" {action}", sub.code, sub.title),
    )
    .in_section(anchor)
    .at_code(&sub.code)
    .values(old, new)
}

fn diff_subsection(anchor: SectionType, old: &Subsection, new: &Subsection, changes: &mut Vec<Change>) {
    let code = lower(&old.code, &new.code);
    let base = format!("{anchor}/{code}");
    let label = format!("{anchor} {code}");
    let mut push = |change_type: ChangeType, field: &str, description: String, before: Value, after: Value| {
        changes.push(
            Change::new(
                change_type,
                ChangeAction::Modified,
                format!("{base}/{field}"),
                description,
            )
            .in_section(anchor)
            .at_code(code)
            .values(Some(before), Some(after)),
        );
    };

    if old.order != new.order {
        push(
            ChangeType::Subsection,
            "order",
            format!("Subsection {label} moved from position {} to {}", old.order, new.order),
            json!(old.order),
            json!(new.order),
        );
    }

    if old.title != new.title {
        push(
            ChangeType::Metadata,
            "title",
            format!(
                "Subsection {label} title changed from \"{}\" to \"{}\"",
                old.title, new.title
            ),
            json!(old.title),
            json!(new.title),
        );
    }

    if old.code != new.code {
        push(
            ChangeType::Metadata,
            "code",
            format!("Subsection {label} renumbered from {} to {}", old.code, new.code),
            json!(old.code),
            json!(new.code),
        );
    }

    if old.content != new.content {
        push(
            ChangeType::Content,
            "content",
            describe_content_change(&label, &old.content, &new.content),
            old.content.clone(),
            new.content.clone(),
        );
    }

    if old.images != new.images {
        push(
            ChangeType::Content,
            "images",
            describe_image_change(&label, &old.images, &new.images),
            json!(old.images),
            json!(new.images),
        );
    }
}

fn describe_image_change(label: &str, old: &[Image], new: &[Image]) -> String {
    let added = new.iter().filter(|n| old.iter().all(|o| o.id != n.id)).count();
    let removed = old.iter().filter(|o| new.iter().all(|n| n.id != o.id)).count();
    if added == 0 && removed == 0 {
        format!("Images of {label} updated")
    } else {
        format!("Images of {label} changed: {added} added, {removed} removed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eaip_types::DocumentStatus;

    fn base() -> DocumentContent {
        DocumentContent::new(DocumentMetadata::new("eAIP Turkey", "LT"))
            .with_section(
                Section::new("s-gen", SectionType::Gen, "General", 0)
                    .with_subsection(Subsection::new("g1", "1.1", "Intro", 0).with_text("Hello"))
                    .with_subsection(Subsection::new("g2", "1.2", "Charges", 1).with_text("Fees apply")),
            )
            .with_section(
                Section::new("s-enr", SectionType::Enr, "En-route", 1)
                    .with_subsection(Subsection::new("e1", "1.1", "Rules", 0).with_text("VFR")),
            )
    }

    fn paths(changes: &[Change]) -> Vec<(ChangeType, ChangeAction, &str)> {
        changes
            .iter()
            .map(|c| (c.change_type, c.action, c.path.as_str()))
            .collect()
    }

    #[test]
    fn identical_contents_have_no_changes() {
        assert!(diff_contents(&base(), &base()).is_empty());
    }

    #[test]
    fn subsection_title_change_is_metadata() {
        let old = base();
        let mut new = old.clone();
        new.sections[0].subsections[0].title = "Introduction".into();

        let changes = diff_contents(&old, &new);
        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.change_type, ChangeType::Metadata);
        assert_eq!(change.action, ChangeAction::Modified);
        assert_eq!(change.path, "GEN/1.1/title");
        assert_eq!(change.old_value, Some(json!("Intro")));
        assert_eq!(change.new_value, Some(json!("Introduction")));
        assert_eq!(change.section_type, Some(SectionType::Gen));
        assert_eq!(change.section_code.as_deref(), Some("1.1"));
    }

    #[test]
    fn content_and_title_are_separate_changes() {
        let old = base();
        let mut new = old.clone();
        let sub = &mut new.sections[0].subsections[0];
        sub.title = "Introduction".into();
        *sub = sub.clone().with_text("Hello world");

        assert_eq!(
            paths(&diff_contents(&old, &new)),
            vec![
                (ChangeType::Metadata, ChangeAction::Modified, "GEN/1.1/title"),
                (ChangeType::Content, ChangeAction::Modified, "GEN/1.1/content"),
            ]
        );
    }

    #[test]
    fn added_and_removed_sections() {
        let old = base();
        let mut new = old.clone();
        new.sections.remove(1);
        new.sections
            .push(Section::new("s-ad", SectionType::Ad, "Aerodromes", 2));

        assert_eq!(
            paths(&diff_contents(&old, &new)),
            vec![
                (ChangeType::Section, ChangeAction::Removed, "ENR"),
                (ChangeType::Section, ChangeAction::Added, "AD"),
            ]
        );
    }

    #[test]
    fn added_section_does_not_report_its_subsections() {
        let old = base();
        let mut new = old.clone();
        new.sections.push(
            Section::new("s-ad", SectionType::Ad, "Aerodromes", 2)
                .with_subsection(Subsection::new("a1", "2.1", "LTFM", 0)),
        );
        let changes = diff_contents(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "AD");
    }

    #[test]
    fn subsection_added_and_removed() {
        let old = base();
        let mut new = old.clone();
        new.sections[0].subsections.remove(1);
        new.sections[0]
            .subsections
            .push(Subsection::new("g3", "1.3", "Holidays", 2));

        assert_eq!(
            paths(&diff_contents(&old, &new)),
            vec![
                (ChangeType::Subsection, ChangeAction::Removed, "GEN/1.2"),
                (ChangeType::Subsection, ChangeAction::Added, "GEN/1.3"),
            ]
        );
    }

    #[test]
    fn move_across_sections_is_remove_and_add() {
        let old = base();
        let mut new = old.clone();
        let moved = new.sections[0].subsections.remove(1);
        new.sections[1].subsections.push(Subsection { order: 1, ..moved });

        assert_eq!(
            paths(&diff_contents(&old, &new)),
            vec![
                (ChangeType::Subsection, ChangeAction::Removed, "GEN/1.2"),
                (ChangeType::Subsection, ChangeAction::Added, "ENR/1.2"),
            ]
        );
    }

    #[test]
    fn reorder_reports_order_changes() {
        let old = base();
        let mut new = old.clone();
        new.sections[0].subsections[0].order = 1;
        new.sections[0].subsections[1].order = 0;

        let changes = diff_contents(&old, &new);
        assert_eq!(
            paths(&changes),
            vec![
                (ChangeType::Subsection, ChangeAction::Modified, "GEN/1.2/order"),
                (ChangeType::Subsection, ChangeAction::Modified, "GEN/1.1/order"),
            ]
        );
    }

    #[test]
    fn section_type_change_anchors_on_lower_tag() {
        let old = base();
        let mut new = old.clone();
        new.sections[1].section_type = SectionType::Ad;
        new.sections[1].subsections[0].title = "Aerodrome rules".into();

        let forward = diff_contents(&old, &new);
        assert_eq!(
            paths(&forward),
            vec![
                (ChangeType::Section, ChangeAction::Modified, "AD/type"),
                (ChangeType::Metadata, ChangeAction::Modified, "AD/1.1/title"),
            ]
        );
        let backward = diff_contents(&new, &old);
        assert_eq!(paths(&backward), paths(&forward));
    }

    #[test]
    fn renumbering_anchors_on_lower_code() {
        let old = base();
        let mut new = old.clone();
        new.sections[0].subsections[1].code = "1.0".into();

        let changes = diff_contents(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "GEN/1.0/code");
        assert_eq!(diff_contents(&new, &old)[0].path, "GEN/1.0/code");
    }

    #[test]
    fn document_metadata_comes_first() {
        let old = base();
        let mut new = old.clone();
        new.metadata.status = DocumentStatus::Published;
        new.metadata.properties.insert("language".into(), json!("en"));
        new.sections[0].title = "General (GEN)".into();

        assert_eq!(
            paths(&diff_contents(&old, &new)),
            vec![
                (ChangeType::Metadata, ChangeAction::Modified, "metadata/status"),
                (ChangeType::Metadata, ChangeAction::Modified, "metadata/properties.language"),
                (ChangeType::Metadata, ChangeAction::Modified, "GEN/title"),
            ]
        );
    }

    #[test]
    fn image_changes_are_content() {
        let old = base();
        let mut new = old.clone();
        new.sections[0].subsections[0].images.push(Image {
            id: "img-1".into(),
            filename: "chart.png".into(),
            original_name: "Chart.png".into(),
            url: "/uploads/chart.png".into(),
            size: 2048,
            mime_type: "image/png".into(),
            uploaded_at: chrono_epoch(),
            uploaded_by: None,
        });
        let changes = diff_contents(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Content);
        assert_eq!(changes[0].path, "GEN/1.1/images");
        assert_eq!(changes[0].description, "Images of GEN 1.1 changed: 1 added, 0 removed");
    }

    fn chrono_epoch() -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(0).unwrap()
    }

    #[test]
    fn modification_metadata_is_not_compared() {
        let old = base();
        let mut new = old.clone();
        new.sections[0].subsections[0].last_modified = chrono_epoch();
        assert!(diff_contents(&old, &new).is_empty());
    }

    #[test]
    fn compare_contents_has_no_versions() {
        let doc = DocumentId::new();
        let set = compare_contents(doc, &base(), &DocumentContent::default());
        assert_eq!(set.document, doc);
        assert!(set.from.is_none() && set.to.is_none());
        assert_eq!(set.summary.sections_removed, 2);
        assert_eq!(set.summary.metadata_modified, 2);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_subsections() -> impl Strategy<Value = Vec<Subsection>> {
            prop::sample::subsequence(vec!["a", "b", "c", "d"], 0..=4).prop_flat_map(|ids| {
                let n = ids.len();
                (
                    Just(ids),
                    prop::collection::vec(prop::sample::select(vec!["1.1", "1.2", "1.3"]), n),
                    prop::collection::vec(prop::sample::select(vec!["Intro", "Charges"]), n),
                    prop::collection::vec(prop::sample::select(vec!["", "VFR only", "Runway closed"]), n),
                    prop::collection::vec(0u32..3, n),
                )
                    .prop_map(|(ids, codes, titles, texts, orders)| {
                        ids.into_iter()
                            .enumerate()
                            .map(|(i, id)| {
                                Subsection::new(id, codes[i], titles[i], orders[i]).with_text(texts[i])
                            })
                            .collect()
                    })
            })
        }

        fn arb_section(id: &'static str) -> impl Strategy<Value = Section> {
            (
                prop::sample::select(SectionType::ALL.to_vec()),
                prop::sample::select(vec!["General", "En-route"]),
                0u32..3,
                arb_subsections(),
            )
                .prop_map(move |(section_type, title, order, subsections)| Section {
                    subsections,
                    ..Section::new(id, section_type, title, order)
                })
        }

        fn arb_content() -> impl Strategy<Value = DocumentContent> {
            (
                prop::option::of(arb_section("s1")),
                prop::option::of(arb_section("s2")),
                prop::option::of(arb_section("s3")),
                prop::sample::select(vec!["eAIP", "eAIP Turkey"]),
            )
                .prop_map(|(a, b, c, title)| DocumentContent {
                    metadata: DocumentMetadata::new(title, "LT"),
                    sections: [a, b, c].into_iter().flatten().collect(),
                })
        }

        fn classification(changes: &[Change], invert: bool) -> Vec<(ChangeType, ChangeAction, String)> {
            let mut out: Vec<_> = changes
                .iter()
                .map(|c| {
                    let action = if invert { c.action.inverse() } else { c.action };
                    (c.change_type, action, c.path.clone())
                })
                .collect();
            out.sort();
            out
        }

        proptest! {
            #[test]
            fn self_diff_is_empty(content in arb_content()) {
                prop_assert!(diff_contents(&content, &content).is_empty());
            }

            #[test]
            fn diff_is_deterministic(a in arb_content(), b in arb_content()) {
                let doc = DocumentId::new();
                prop_assert_eq!(compare_contents(doc, &a, &b), compare_contents(doc, &a, &b));
            }

            #[test]
            fn classification_is_symmetric(a in arb_content(), b in arb_content()) {
                prop_assert_eq!(
                    classification(&diff_contents(&a, &b), false),
                    classification(&diff_contents(&b, &a), true)
                );
            }

            #[test]
            fn summary_is_a_tally(a in arb_content(), b in arb_content()) {
                let set = compare_contents(DocumentId::new(), &a, &b);
                let count = |t: ChangeType, act: ChangeAction| {
                    set.changes.iter().filter(|c| c.change_type == t && c.action == act).count()
                };
                prop_assert_eq!(set.summary.total(), set.len());
                prop_assert_eq!(set.summary.sections_added, count(ChangeType::Section, ChangeAction::Added));
                prop_assert_eq!(set.summary.sections_removed, count(ChangeType::Section, ChangeAction::Removed));
                prop_assert_eq!(set.summary.subsections_added, count(ChangeType::Subsection, ChangeAction::Added));
                prop_assert_eq!(set.summary.subsections_removed, count(ChangeType::Subsection, ChangeAction::Removed));
            }
        }
    }
}
