//! Shared foundation types for the Cedar formatter.
//!
//! Holds the pieces every other crate agrees on:
//!
//! - [`Span`]: compact byte-range source locations
//! - [`SyntaxNode`] / [`NodeKind`]: the generic syntax tree the traversal
//!   protocol walks
//! - [`SourceRecords`]: the collaborator-supplied records (macro
//!   expansions, conditional-compilation directives, comments) the
//!   skip-region table is built from
//!
//! The tree is deliberately generic: a node is a kind, a file span, an
//! expansion flag, and ordered children. Per-construct payloads (operator
//! tokens, names) stay in the token stream and are re-encountered by the
//! formatter's scanner, which is what keeps the edit list minimal.

mod node;
mod records;
mod span;

pub use node::{NodeKind, SyntaxNode};
pub use records::{
    CommentRecord, DirectiveKind, DirectiveRecord, MacroExpansionRecord, SourceRecords,
};
pub use span::{Span, SpanError};
