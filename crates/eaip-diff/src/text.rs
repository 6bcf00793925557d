//! Rich-text helpers: plain-text extraction and word-level tallies.
//!
//! The editor stores content as a tree of nodes, each with an optional
//! `text` leaf and an optional `content` array of children. Only the text
//! is interpreted here; marks and attributes are compared structurally by
//! the caller.

use serde_json::Value;
use similar::{ChangeTag, TextDiff};

/// Concatenate the text leaves of a rich-text tree. Block nodes are
/// separated by a single space.
pub fn plain_text(node: &Value) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out.trim().to_string()
}

fn collect_text(node: &Value, out: &mut String) {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get("text") {
                out.push_str(text);
            }
            if let Some(Value::Array(children)) = map.get("content") {
                for child in children {
                    collect_text(child, out);
                }
                if !out.ends_with(' ') {
                    out.push(' ');
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_text(item, out);
            }
        }
        Value::String(text) => out.push_str(text),
        _ => {}
    }
}

/// Words inserted and deleted between two texts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WordTally {
    pub added: usize,
    pub removed: usize,
}

impl WordTally {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Word-level diff of two texts (Myers, via `similar`).
pub fn word_tally(old: &str, new: &str) -> WordTally {
    let mut tally = WordTally::default();
    if old == new {
        return tally;
    }
    let diff = TextDiff::from_words(old, new);
    for change in diff.iter_all_changes() {
        if change.value().trim().is_empty() {
            continue;
        }
        match change.tag() {
            ChangeTag::Insert => tally.added += 1,
            ChangeTag::Delete => tally.removed += 1,
            ChangeTag::Equal => {}
        }
    }
    tally
}

/// Human-readable summary of a content edit for `label` (e.g. `GEN 1.1`).
pub fn describe_content_change(label: &str, old: &Value, new: &Value) -> String {
    let tally = word_tally(&plain_text(old), &plain_text(new));
    if tally.is_empty() {
        return format!("Formatting of {label} modified");
    }
    format!(
        "Content of {label} modified: {} added, {} removed",
        plural(tally.added, "word"),
        plural(tally.removed, "word")
    )
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
