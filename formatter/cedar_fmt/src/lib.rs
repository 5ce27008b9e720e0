//! Incremental formatter engine for C-family source.
//!
//! The engine takes the original text, a generic syntax tree, and the
//! collaborator records (macro expansions, conditional directives,
//! comments), and produces a minimal list of text edits: tokens are never
//! copied, only the whitespace gaps between them are rewritten. Layout that
//! does not fit the page width is solved by stack of alignment frames with
//! checkpointed retries; regions the pass must not touch (inactive
//! conditional branches, expansion sites, format-off spans) are copied
//! byte-for-byte.
//!
//! Entry points: [`format_unit`] for a whole file, [`format_regions`] for
//! scoped emission out of one shared pass, [`apply_edits`] to materialize
//! an edit list.
//!
//! ```
//! use cedar_fmt::{format_unit, apply_edits, FormatConfig};
//! use cedar_parse::parse;
//!
//! let source = "int  x=1;\n";
//! let parsed = parse(source);
//! let config = FormatConfig::default();
//! let outcome = format_unit(source, &parsed.root, &parsed.records, &config)?;
//! assert_eq!(apply_edits(source, &outcome.edits), "int x = 1;\n");
//! # Ok::<(), cedar_fmt::FormatError>(())
//! ```

mod align;
mod config;
mod edit;
mod error;
mod rules;
mod scribe;
mod skip;
mod traverse;

use cedar_diagnostic::Diagnostic;
use cedar_ir::{SourceRecords, Span, SyntaxNode};
use cedar_lexer::SourceBuffer;
use tracing::debug;

use crate::error::Interrupt;
use crate::scribe::Scribe;
use crate::traverse::Walker;

pub use crate::align::{AlignFlags, TieBreak, WrapMode};
pub use crate::config::{FormatConfig, IndentStyle};
pub use crate::edit::{apply_edits, TextEdit};
pub use crate::error::FormatError;
pub use crate::skip::{SkipKind, SkipRegion, SkipTable};

/// Result of a successful pass. Diagnostics are advisory: they report
/// constructs the pass copied verbatim, never a reason to discard edits.
#[derive(Debug)]
pub struct FormatOutcome {
    pub edits: Vec<TextEdit>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Format a whole translation unit.
///
/// On error the source must be treated as unchanged; partial edit lists
/// are never exposed.
pub fn format_unit(
    source: &str,
    root: &SyntaxNode,
    records: &SourceRecords,
    config: &FormatConfig,
) -> Result<FormatOutcome, FormatError> {
    let len = source.len();
    if u32::try_from(len).is_err() {
        return Err(FormatError::SourceTooLarge { len });
    }
    debug!(len, page_width = config.page_width, "formatting pass start");
    let buf = SourceBuffer::new(source);
    let skip = SkipTable::build(source, records, config);
    let scribe = Scribe::new(source, &buf, config, &skip);
    let mut walker = Walker::new(scribe, config, &skip);
    let run = walker
        .format_node(root)
        .and_then(|()| walker.scribe.finish());
    match run {
        Ok(()) => {}
        Err(Interrupt::Abort(err)) => return Err(err),
        Err(Interrupt::NeedsBreak { .. }) => {
            return Err(FormatError::Internal("wrap request escaped every alignment"))
        }
        Err(Interrupt::NotFormattable { .. }) => {
            return Err(FormatError::Internal(
                "unformattable construct escaped containment",
            ))
        }
    }
    let (edits, diagnostics) = walker.scribe.into_output();
    debug!(
        edits = edits.len(),
        diagnostics = diagnostics.len(),
        "formatting pass done"
    );
    Ok(FormatOutcome { edits, diagnostics })
}

/// Format once, emit independently per requested region.
///
/// Each returned list contains exactly the edits of the shared pass that
/// fall entirely inside the corresponding region; edits straddling a
/// region boundary are dropped rather than clipped.
pub fn format_regions(
    source: &str,
    root: &SyntaxNode,
    records: &SourceRecords,
    config: &FormatConfig,
    regions: &[Span],
) -> Result<Vec<Vec<TextEdit>>, FormatError> {
    let outcome = format_unit(source, root, records, config)?;
    Ok(regions
        .iter()
        .map(|region| {
            outcome
                .edits
                .iter()
                .filter(|edit| region.start <= edit.offset && edit.end() <= region.end)
                .cloned()
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests;
