//! Pass-fatal errors and the internal control-flow interrupt.
//!
//! The formatter never panics on malformed input. Anything that stops the
//! whole pass surfaces as [`FormatError`]; everything else travels as an
//! [`Interrupt`] on the `Err` arm of [`Fmt`] and is caught at a well-known
//! frame: `NeedsBreak` by the alignment that owns the break, and
//! `NotFormattable` by the enclosing sibling run, which falls back to a
//! verbatim copy of the offending construct.

use cedar_ir::Span;
use thiserror::Error;

/// A formatting pass failed as a whole. Callers must treat the source text
/// as unchanged; no partial edit list is ever exposed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// The scanner produced a token the traversal did not expect. This
    /// means the tree and the text disagree, so every edit computed so far
    /// is suspect.
    #[error("formatter lost sync with the token stream at offset {offset}: expected {expected}, found {found}")]
    Desynchronized {
        offset: u32,
        expected: &'static str,
        found: String,
    },

    /// Compact spans store offsets as `u32`.
    #[error("source of {len} bytes exceeds the supported span range")]
    SourceTooLarge { len: usize },

    /// An internal invariant broke (for example a wrap request escaped
    /// every alignment frame).
    #[error("formatter invariant violated: {0}")]
    Internal(&'static str),
}

/// Non-fatal control flow used inside a pass.
#[derive(Debug)]
pub(crate) enum Interrupt {
    /// A line overflowed and an alignment frame agreed to take a break.
    /// `relative_depth` counts frames up from the innermost: the handler
    /// at depth 0 rewinds and retries, everyone shallower pops itself and
    /// re-raises with the depth decremented.
    NeedsBreak { relative_depth: usize },

    /// The current construct cannot be formatted (a parse `Problem` or an
    /// unexpected token inside one). The enclosing sibling run copies the
    /// construct verbatim and records one diagnostic.
    NotFormattable { at: Span },

    /// Unrecoverable; unwinds the whole pass.
    Abort(FormatError),
}

impl From<FormatError> for Interrupt {
    fn from(err: FormatError) -> Self {
        Interrupt::Abort(err)
    }
}

/// Result alias used throughout the engine.
pub(crate) type Fmt<T> = Result<T, Interrupt>;
