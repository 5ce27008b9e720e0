//! Small C-family front end for the Cedar formatter.
//!
//! This crate exists to feed [`cedar_fmt`]: it produces the coarse
//! generic tree and the collaborator records (comments, evaluated
//! conditional directives, macro expansion sites) one formatting pass
//! consumes. It is not a compiler front end; there is no symbol
//! resolution and no type checking, and parse errors never fail the
//! pass — unparsable regions become `Problem` nodes the formatter
//! copies verbatim.
//!
//! ```
//! use cedar_ir::NodeKind;
//! use cedar_parse::parse;
//!
//! let parsed = parse("int x = 1;\n");
//! assert_eq!(parsed.root.kind, NodeKind::TranslationUnit);
//! assert_eq!(parsed.root.children[0].kind, NodeKind::Declaration);
//! ```
//!
//! [`cedar_fmt`]: https://docs.rs/cedar_fmt

mod collect;
mod parser;

use cedar_ir::{SourceRecords, SyntaxNode};
use cedar_lexer::SourceBuffer;
use tracing::debug;

/// A parsed file: the tree plus the records the formatter's skip table
/// is built from.
#[derive(Debug)]
pub struct ParseOutput {
    pub root: SyntaxNode,
    pub records: SourceRecords,
}

/// Parse a source file. Infallible: malformed constructs surface as
/// `Problem` nodes, never as errors.
pub fn parse(source: &str) -> ParseOutput {
    let buf = SourceBuffer::new(source);
    let collected = collect::collect(source, &buf);
    let mut parser = parser::Parser::new(source, &collected.tokens, &collected.fn_macros);
    let root = parser.translation_unit();
    let mut records = collected.records;
    records.expansions = parser.into_expansions();
    debug!(
        nodes = root.node_count(),
        expansions = records.expansions.len(),
        "parse done"
    );
    ParseOutput { root, records }
}

#[cfg(test)]
mod tests;
