use cedar_ir::SourceRecords;
use cedar_lexer::{SourceBuffer, TokenKind};
use pretty_assertions::assert_eq;

use super::Scribe;
use crate::config::FormatConfig;
use crate::edit::{apply_edits, TextEdit};
use crate::error::Fmt;
use crate::skip::SkipTable;

fn must<T>(result: Fmt<T>) -> T {
    match result {
        Ok(value) => value,
        Err(interrupt) => panic!("unexpected interrupt: {interrupt:?}"),
    }
}

fn empty_skip(source: &str, config: &FormatConfig) -> SkipTable {
    SkipTable::build(source, &SourceRecords::empty(), config)
}

fn output(scribe: Scribe<'_>, source: &str) -> String {
    let (edits, _) = scribe.into_output();
    apply_edits(source, &edits)
}

#[test]
fn single_line_gaps_collapse_to_what_the_rules_ask_for() {
    let source = "x   ;";
    let buf = SourceBuffer::new(source);
    let config = FormatConfig::default();
    let skip = empty_skip(source, &config);
    let mut scribe = Scribe::new(source, &buf, &config, &skip);
    must(scribe.print_token(TokenKind::Ident, false));
    must(scribe.print_token(TokenKind::Semi, false));
    assert_eq!(output(scribe, source), "x;");
}

#[test]
fn already_formatted_text_yields_no_edits() {
    let source = "x = y;\n";
    let buf = SourceBuffer::new(source);
    let config = FormatConfig::default();
    let skip = empty_skip(source, &config);
    let mut scribe = Scribe::new(source, &buf, &config, &skip);
    must(scribe.print_token(TokenKind::Ident, false));
    must(scribe.print_token(TokenKind::Assign, true));
    must(scribe.print_token(TokenKind::Ident, true));
    must(scribe.print_token(TokenKind::Semi, false));
    must(scribe.finish());
    let (edits, _) = scribe.into_output();
    assert_eq!(edits, Vec::<TextEdit>::new());
}

#[test]
fn blank_lines_are_capped_at_the_configured_count() {
    let source = "x\n\n\n\ny";
    let buf = SourceBuffer::new(source);
    let config = FormatConfig::default();
    let skip = empty_skip(source, &config);
    let mut scribe = Scribe::new(source, &buf, &config, &skip);
    must(scribe.print_token(TokenKind::Ident, false));
    scribe.start_new_line();
    must(scribe.print_token(TokenKind::Ident, false));
    assert_eq!(output(scribe, source), "x\n\ny");
}

#[test]
fn trailing_comment_stays_on_its_statement_line() {
    let source = "x; // note\ny;\n";
    let buf = SourceBuffer::new(source);
    let config = FormatConfig::default();
    let skip = empty_skip(source, &config);
    let mut scribe = Scribe::new(source, &buf, &config, &skip);
    must(scribe.print_token(TokenKind::Ident, false));
    must(scribe.print_token(TokenKind::Semi, false));
    must(scribe.print_trailing_comment());
    scribe.start_new_line();
    must(scribe.print_token(TokenKind::Ident, false));
    must(scribe.print_token(TokenKind::Semi, false));
    must(scribe.finish());
    let (edits, _) = scribe.into_output();
    assert_eq!(edits, Vec::<TextEdit>::new());
}

#[test]
fn contiguous_line_comments_keep_their_relative_indentation() {
    // The run is re-anchored to the current indentation, but the extra
    // two columns on the second comment must survive.
    let source = "x;\n// a\n  // b\ny;\n";
    let buf = SourceBuffer::new(source);
    let config = FormatConfig::default();
    let skip = empty_skip(source, &config);
    let mut scribe = Scribe::new(source, &buf, &config, &skip);
    scribe.indent();
    must(scribe.print_token(TokenKind::Ident, false));
    must(scribe.print_token(TokenKind::Semi, false));
    must(scribe.print_trailing_comment());
    scribe.start_new_line();
    must(scribe.print_comments());
    scribe.unindent();
    must(scribe.print_token(TokenKind::Ident, false));
    must(scribe.print_token(TokenKind::Semi, false));
    must(scribe.finish());
    assert_eq!(output(scribe, source), "    x;\n    // a\n      // b\ny;\n");
}

#[test]
fn directives_keep_their_own_line_without_edits() {
    let source = "x\n#define WIDTH 80\ny\n";
    let buf = SourceBuffer::new(source);
    let config = FormatConfig::default();
    let skip = empty_skip(source, &config);
    let mut scribe = Scribe::new(source, &buf, &config, &skip);
    must(scribe.print_token(TokenKind::Ident, false));
    must(scribe.print_token(TokenKind::Ident, false));
    must(scribe.finish());
    let (edits, _) = scribe.into_output();
    assert_eq!(edits, Vec::<TextEdit>::new());
}

#[test]
fn checkpoint_restore_rewinds_state_and_edits() {
    let source = "a   b   c";
    let buf = SourceBuffer::new(source);
    let config = FormatConfig::default();
    let skip = empty_skip(source, &config);
    let mut scribe = Scribe::new(source, &buf, &config, &skip);
    must(scribe.print_token(TokenKind::Ident, false));
    let checkpoint = scribe.checkpoint();
    must(scribe.print_token(TokenKind::Ident, true));
    must(scribe.print_token(TokenKind::Ident, true));
    scribe.restore(&checkpoint);
    // Replay with different spacing; the first attempt must leave no
    // trace in the edit list.
    must(scribe.print_token(TokenKind::Ident, false));
    must(scribe.print_token(TokenKind::Ident, false));
    assert_eq!(output(scribe, source), "abc");
}

#[test]
fn print_raw_copies_bytes_and_tracks_braces() {
    let source = "{ @@garbage!! }x";
    let buf = SourceBuffer::new(source);
    let config = FormatConfig::default();
    let skip = empty_skip(source, &config);
    let mut scribe = Scribe::new(source, &buf, &config, &skip);
    must(scribe.print_raw(15));
    let indents_after = scribe.indent_count();
    must(scribe.print_token(TokenKind::Ident, false));
    let (edits, _) = scribe.into_output();
    assert_eq!(edits, Vec::<TextEdit>::new());
    assert_eq!(indents_after, 0);
}

#[test]
fn trailing_whitespace_is_trimmed_but_the_final_newline_survives() {
    let source = "x;   \n";
    let buf = SourceBuffer::new(source);
    let config = FormatConfig::default();
    let skip = empty_skip(source, &config);
    let mut scribe = Scribe::new(source, &buf, &config, &skip);
    must(scribe.print_token(TokenKind::Ident, false));
    must(scribe.print_token(TokenKind::Semi, false));
    must(scribe.finish());
    assert_eq!(output(scribe, source), "x;\n");
}
