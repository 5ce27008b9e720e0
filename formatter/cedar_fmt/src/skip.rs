//! Regions the formatter must copy verbatim.
//!
//! Three sources feed the table: conditional-compilation branches that are
//! not taken for the current define set, macro-expansion sites, and
//! off/on marker comments. Regions of one kind never overlap; the scribe
//! and the traversal query the table by containment before touching any
//! byte.

use cedar_ir::{DirectiveKind, SourceRecords, Span};

use crate::config::FormatConfig;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SkipKind {
    /// Inside a conditional branch the evaluator marked not taken.
    InactiveBranch,
    /// Text produced by or belonging to a macro expansion site.
    MacroExpansion,
    /// Between a format-off marker comment and its matching on marker.
    NoFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SkipRegion {
    pub kind: SkipKind,
    pub span: Span,
}

/// Sorted table of verbatim regions for one source file.
#[derive(Debug, Default)]
pub struct SkipTable {
    regions: Vec<SkipRegion>,
}

impl SkipTable {
    pub fn build(source: &str, records: &SourceRecords, config: &FormatConfig) -> Self {
        let mut regions = Vec::new();
        let source_len = u32::try_from(source.len()).unwrap_or(u32::MAX);
        collect_inactive_branches(records, source_len, &mut regions);
        collect_no_format_ranges(source, records, config, &mut regions);
        for expansion in &records.expansions {
            regions.push(SkipRegion {
                kind: SkipKind::MacroExpansion,
                span: expansion.span,
            });
        }
        regions.sort_by_key(|region| (region.span.start, region.span.end));
        SkipTable { regions }
    }

    /// The verbatim region containing `offset`, if any. Expansion regions
    /// are resolved by the traversal through the tree's expansion flags,
    /// so token-level queries skip them.
    pub fn verbatim_at(&self, offset: u32) -> Option<&SkipRegion> {
        self.regions
            .iter()
            .find(|region| region.kind != SkipKind::MacroExpansion && region.span.contains(offset))
    }

    /// The region of any kind containing `offset`.
    pub fn region_at(&self, offset: u32) -> Option<&SkipRegion> {
        self.regions.iter().find(|region| region.span.contains(offset))
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn regions(&self) -> &[SkipRegion] {
        &self.regions
    }
}

/// Walk the directive records with a nesting stack and emit one region per
/// maximal run of inactive text. A branch is inactive when its own `taken`
/// flag is false or when any enclosing branch already is.
fn collect_inactive_branches(records: &SourceRecords, source_len: u32, regions: &mut Vec<SkipRegion>) {
    struct Level {
        active: bool,
    }
    let mut stack: Vec<Level> = Vec::new();
    let mut inactive_from: Option<u32> = None;

    for directive in &records.directives {
        match directive.kind {
            kind if kind.opens_group() => {
                stack.push(Level {
                    active: directive.taken,
                });
            }
            DirectiveKind::Elif | DirectiveKind::Else => {
                if let Some(level) = stack.last_mut() {
                    level.active = directive.taken;
                }
            }
            DirectiveKind::Endif => {
                stack.pop();
            }
            _ => {}
        }
        let now_active = stack.iter().all(|level| level.active);
        match (inactive_from, now_active) {
            (None, false) => inactive_from = Some(directive.span.end),
            (Some(start), true) => {
                // The directive restoring activity stays active text, so
                // the region ends right before it.
                regions.push(SkipRegion {
                    kind: SkipKind::InactiveBranch,
                    span: Span::new(start, directive.span.start),
                });
                inactive_from = None;
            }
            _ => {}
        }
    }
    if let Some(start) = inactive_from {
        // Unterminated group; verbatim to the end of the file.
        if source_len > start {
            regions.push(SkipRegion {
                kind: SkipKind::InactiveBranch,
                span: Span::new(start, source_len),
            });
        }
    }
}

/// Pair off/on marker comments into `NoFormat` regions. An off marker
/// without a matching on marker runs to the end of the file.
fn collect_no_format_ranges(
    source: &str,
    records: &SourceRecords,
    config: &FormatConfig,
    regions: &mut Vec<SkipRegion>,
) {
    let mut off_at: Option<u32> = None;
    for comment in &records.comments {
        let text = &source[comment.span.to_range()];
        if off_at.is_none() && text.contains(config.format_off_marker.as_str()) {
            off_at = Some(comment.span.start);
        } else if let Some(start) = off_at {
            if text.contains(config.format_on_marker.as_str()) {
                regions.push(SkipRegion {
                    kind: SkipKind::NoFormat,
                    span: Span::new(start, comment.span.end),
                });
                off_at = None;
            }
        }
    }
    if let Some(start) = off_at {
        let end = u32::try_from(source.len()).unwrap_or(u32::MAX);
        regions.push(SkipRegion {
            kind: SkipKind::NoFormat,
            span: Span::new(start, end),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cedar_ir::DirectiveRecord;
    use pretty_assertions::assert_eq;

    fn directive(kind: DirectiveKind, start: u32, end: u32, taken: bool) -> DirectiveRecord {
        DirectiveRecord {
            kind,
            span: Span::new(start, end),
            taken,
        }
    }

    #[test]
    fn not_taken_if_branch_becomes_one_inactive_region() {
        let mut records = SourceRecords::empty();
        records.directives = vec![
            directive(DirectiveKind::If, 0, 5, false),
            directive(DirectiveKind::Endif, 30, 36, false),
        ];
        let table = SkipTable::build("", &records, &FormatConfig::default());
        assert_eq!(
            table.regions(),
            &[SkipRegion {
                kind: SkipKind::InactiveBranch,
                span: Span::new(5, 30),
            }]
        );
    }

    #[test]
    fn taken_branch_leaves_no_region_but_its_else_does() {
        let mut records = SourceRecords::empty();
        records.directives = vec![
            directive(DirectiveKind::Ifdef, 0, 8, true),
            directive(DirectiveKind::Else, 20, 25, false),
            directive(DirectiveKind::Endif, 40, 46, false),
        ];
        let table = SkipTable::build("", &records, &FormatConfig::default());
        assert_eq!(
            table.regions(),
            &[SkipRegion {
                kind: SkipKind::InactiveBranch,
                span: Span::new(25, 40),
            }]
        );
    }

    #[test]
    fn nested_group_inside_inactive_branch_stays_one_region() {
        let mut records = SourceRecords::empty();
        records.directives = vec![
            directive(DirectiveKind::If, 0, 5, false),
            directive(DirectiveKind::Ifdef, 10, 18, true),
            directive(DirectiveKind::Endif, 20, 26, false),
            directive(DirectiveKind::Endif, 30, 36, false),
        ];
        let table = SkipTable::build("", &records, &FormatConfig::default());
        assert_eq!(table.regions().len(), 1);
        assert_eq!(table.regions()[0].span, Span::new(5, 30));
    }

    #[test]
    fn off_and_on_markers_bound_a_no_format_region() {
        let source = "a\n/* cedar-format: off */ messy \n/* cedar-format: on */\nb\n";
        let off = match source.find("/*") {
            Some(at) => at,
            None => 0,
        };
        let on = match source.rfind("/*") {
            Some(at) => at,
            None => 0,
        };
        let mut records = SourceRecords::empty();
        records.comments = vec![
            cedar_ir::CommentRecord {
                span: Span::new(off as u32, off as u32 + 24),
                block: true,
            },
            cedar_ir::CommentRecord {
                span: Span::new(on as u32, on as u32 + 23),
                block: true,
            },
        ];
        let table = SkipTable::build(source, &records, &FormatConfig::default());
        assert_eq!(table.regions().len(), 1);
        let region = table.regions()[0];
        assert_eq!(region.kind, SkipKind::NoFormat);
        assert_eq!(region.span.start, off as u32);
        assert!(table.verbatim_at(region.span.start + 4).is_some());
        assert!(table.verbatim_at(region.span.end + 1).is_none());
    }

    #[test]
    fn unmatched_off_marker_runs_to_end_of_file() {
        let source = "x\n// cedar-format: off\ny\n";
        let off = match source.find("//") {
            Some(at) => at,
            None => 0,
        };
        let mut records = SourceRecords::empty();
        records.comments = vec![cedar_ir::CommentRecord {
            span: Span::new(off as u32, off as u32 + 20),
            block: false,
        }];
        let table = SkipTable::build(source, &records, &FormatConfig::default());
        assert_eq!(table.regions()[0].span.end as usize, source.len());
    }
}
