//! Text edits and the append-only edit log.
//!
//! Every output decision the scribe makes lands here as a replacement
//! against the original bytes. The log keeps the list minimal as it goes:
//! an edit that starts where the previous one ended is merged into it, the
//! prefix a replacement shares with the bytes it replaces is trimmed away,
//! and an edit reduced to nothing is dropped. The result is that a gap the
//! formatter rewrites to its existing text produces no edit at all, which
//! is what makes a second pass over formatted output a no-op.

/// A single replacement: delete `length` bytes at `offset`, insert
/// `replacement`. `length == 0` is a pure insertion, an empty
/// `replacement` a pure deletion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEdit {
    pub offset: u32,
    pub length: u32,
    pub replacement: String,
}

impl TextEdit {
    /// Exclusive end of the replaced range.
    pub fn end(&self) -> u32 {
        self.offset + self.length
    }
}

/// Ordered, non-overlapping edits under construction.
///
/// Appends must come in source order; the scribe's scan frontier only moves
/// forward except through [`EditLog::restore`], which pairs with
/// [`EditLog::snapshot`] for alignment rollback.
#[derive(Debug, Default)]
pub(crate) struct EditLog {
    edits: Vec<TextEdit>,
}

/// Rollback point for the log. The last edit is cloned because later
/// appends may merge into it in place.
#[derive(Clone, Debug, Default)]
pub(crate) struct EditSnapshot {
    len: usize,
    last: Option<TextEdit>,
}

impl EditLog {
    pub fn new() -> Self {
        EditLog::default()
    }

    pub fn snapshot(&self) -> EditSnapshot {
        EditSnapshot {
            len: self.edits.len(),
            last: self.edits.last().cloned(),
        }
    }

    pub fn restore(&mut self, snapshot: &EditSnapshot) {
        self.edits.truncate(snapshot.len);
        // The saved tail only belongs at exactly the snapshot length; a
        // shorter log means that edit no longer exists.
        if self.edits.len() == snapshot.len {
            if let (Some(slot), Some(saved)) = (self.edits.last_mut(), snapshot.last.as_ref()) {
                *slot = saved.clone();
            }
        }
    }

    pub fn insert(&mut self, source: &[u8], offset: u32, text: &str) {
        self.replace(source, offset, 0, text);
    }

    pub fn delete(&mut self, source: &[u8], offset: u32, length: u32) {
        self.replace(source, offset, length, "");
    }

    /// Append a replacement, merging with the previous edit when adjacent.
    pub fn replace(&mut self, source: &[u8], offset: u32, length: u32, replacement: &str) {
        if length == 0 && replacement.is_empty() {
            return;
        }
        match self.edits.last() {
            Some(prev) if prev.end() == offset => {
                if let Some(prev) = self.edits.pop() {
                    let mut merged = prev.replacement;
                    merged.push_str(replacement);
                    self.push_trimmed(source, prev.offset, prev.length + length, merged);
                }
            }
            prev => {
                debug_assert!(
                    prev.map_or(true, |p| p.end() <= offset),
                    "edits must be appended in order"
                );
                self.push_trimmed(source, offset, length, replacement.to_owned());
            }
        }
    }

    /// Drop the prefix the replacement shares with the bytes it replaces,
    /// then keep the edit only if something is left.
    fn push_trimmed(&mut self, source: &[u8], offset: u32, length: u32, replacement: String) {
        let original = &source[offset as usize..(offset + length) as usize];
        let shared = original
            .iter()
            .zip(replacement.as_bytes())
            .take_while(|(a, b)| a == b)
            .count();
        let offset = offset + shared as u32;
        let length = length - shared as u32;
        let replacement = replacement[shared..].to_owned();
        if length == 0 && replacement.is_empty() {
            return;
        }
        self.edits.push(TextEdit {
            offset,
            length,
            replacement,
        });
    }

    pub fn into_edits(self) -> Vec<TextEdit> {
        self.edits
    }
}

/// Apply an ordered edit list to its source text.
pub fn apply_edits(source: &str, edits: &[TextEdit]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0usize;
    for edit in edits {
        out.push_str(&source[cursor..edit.offset as usize]);
        out.push_str(&edit.replacement);
        cursor = edit.end() as usize;
    }
    out.push_str(&source[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn edit(offset: u32, length: u32, replacement: &str) -> TextEdit {
        TextEdit {
            offset,
            length,
            replacement: replacement.to_owned(),
        }
    }

    #[test]
    fn adjacent_delete_and_insert_coalesce_into_one_replacement() {
        // Deleting the gap between two tokens and then inserting the
        // desired whitespace at the same spot is the scribe's normal
        // rhythm; the log must publish it as one edit.
        let source = b"a   b";
        let mut log = EditLog::new();
        log.delete(source, 1, 3);
        log.insert(source, 4, " ");
        let edits = log.into_edits();
        assert_eq!(edits, vec![edit(1, 3, " ")]);
    }

    #[test]
    fn replacement_identical_to_original_produces_no_edit() {
        let source = b"a b";
        let mut log = EditLog::new();
        log.replace(source, 1, 1, " ");
        assert_eq!(log.into_edits(), Vec::<TextEdit>::new());
    }

    #[test]
    fn shared_prefix_is_trimmed_from_the_edit() {
        let source = b"a\n  b";
        let mut log = EditLog::new();
        // Wants "\n    " where the file holds "\n  ": only the two extra
        // spaces should survive.
        log.replace(source, 1, 3, "\n    ");
        assert_eq!(log.into_edits(), vec![edit(4, 0, "  ")]);
    }

    #[test]
    fn insert_then_delete_at_the_same_gap_merges() {
        // printNewLine inserts at the whitespace start, the whitespace is
        // deleted right after; both target the same frontier.
        let source = b"a \tb";
        let mut log = EditLog::new();
        log.insert(source, 1, "\n");
        log.delete(source, 1, 2);
        assert_eq!(log.into_edits(), vec![edit(1, 2, "\n")]);
    }

    #[test]
    fn restore_rewinds_merged_tail_edits() {
        let source = b"x   y   z";
        let mut log = EditLog::new();
        log.replace(source, 1, 3, ",");
        let snapshot = log.snapshot();
        // This merge mutates the surviving edit in place...
        log.replace(source, 4, 0, "!");
        log.replace(source, 5, 3, " ");
        // ...so restore has to put the clone back, not just truncate.
        log.restore(&snapshot);
        assert_eq!(log.into_edits(), vec![edit(1, 3, ",")]);
    }

    #[test]
    fn restore_into_a_shorter_log_leaves_the_survivors_alone() {
        let source = b"q   r";
        let mut log = EditLog::new();
        log.replace(source, 1, 3, " ");
        // A snapshot of a longer log state than the one being restored
        // must not smear its saved tail over an unrelated edit.
        let snapshot = EditSnapshot {
            len: 2,
            last: Some(edit(9, 9, "!")),
        };
        log.restore(&snapshot);
        assert_eq!(log.into_edits(), vec![edit(1, 3, " ")]);
    }

    #[test]
    fn apply_edits_round_trips_ordered_replacements() {
        let source = "int  x=1;";
        let edits = vec![edit(3, 2, " "), edit(6, 1, " = ")];
        assert_eq!(apply_edits(source, &edits), "int x = 1;");
    }

    #[test]
    fn empty_edits_are_never_recorded() {
        let source = b"ab";
        let mut log = EditLog::new();
        log.replace(source, 1, 0, "");
        log.delete(source, 1, 0);
        assert_eq!(log.into_edits(), Vec::<TextEdit>::new());
    }
}
