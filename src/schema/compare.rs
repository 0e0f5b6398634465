//! Schema comparison
//!
//! Line diff of two tree renderings. Useful for checking that two
//! configuration styles, or two revisions of a model, agree.

use similar::{ChangeTag, TextDiff};

use super::Schema;

/// Summary of a comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDiff {
    pub added: usize,
    pub removed: usize,
    /// Unified diff, `old` on the left
    pub unified: String,
}

/// Compare two schemas. Returns `None` when their renderings are identical.
pub fn diff(old: &Schema, new: &Schema) -> Option<SchemaDiff> {
    let old_text = old.render_tree();
    let new_text = new.render_tree();
    if old_text == new_text {
        return None;
    }

    let text_diff = TextDiff::from_lines(&old_text, &new_text);
    let mut added = 0;
    let mut removed = 0;
    for change in text_diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => removed += 1,
            ChangeTag::Equal => {}
        }
    }

    let unified = text_diff
        .unified_diff()
        .context_radius(3)
        .header(old.name(), new.name())
        .to_string();

    Some(SchemaDiff {
        added,
        removed,
        unified,
    })
}
