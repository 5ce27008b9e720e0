//! Token collection and conditional-directive evaluation.
//!
//! One scan over the file produces the significant-token stream the
//! parser consumes, the comment and directive records the formatter's
//! skip table is built from, and the macro define table. Tokens inside
//! not-taken conditional branches are dropped from the stream; their
//! text is preserved by the formatter's verbatim regions, not by the
//! tree.

use cedar_ir::{CommentRecord, DirectiveKind, DirectiveRecord, SourceRecords, Span};
use cedar_lexer::{Scanner, SourceBuffer, Token, TokenKind};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

pub(crate) struct Collected {
    /// Significant tokens from taken branches only, in file order.
    pub tokens: Vec<Token>,
    pub records: SourceRecords,
    /// Names defined as function-style macros (`#define F(a) ..`).
    pub fn_macros: FxHashSet<String>,
}

/// One open `#if`/`#ifdef`/`#ifndef` group.
struct CondGroup {
    /// Whether any branch of this group has matched yet.
    any_taken: bool,
    /// Whether the current branch is active, enclosure included.
    active: bool,
}

pub(crate) fn collect(source: &str, buf: &SourceBuffer) -> Collected {
    let mut scanner = Scanner::new(buf);
    let mut tokens = Vec::new();
    let mut records = SourceRecords::empty();
    let mut defines: FxHashSet<String> = FxHashSet::default();
    let mut fn_macros: FxHashSet<String> = FxHashSet::default();
    let mut groups: Vec<CondGroup> = Vec::new();

    loop {
        let token = scanner.next_token();
        match token.kind {
            TokenKind::Eof => break,
            TokenKind::Whitespace => {}
            TokenKind::LineComment | TokenKind::BlockComment => {
                records.comments.push(CommentRecord {
                    span: Span::new(token.start, token.end),
                    block: token.kind == TokenKind::BlockComment,
                });
            }
            TokenKind::Preprocessor => {
                handle_directive(
                    source,
                    token,
                    &mut defines,
                    &mut fn_macros,
                    &mut groups,
                    &mut records,
                );
            }
            _ => {
                if groups.iter().all(|g| g.active) {
                    tokens.push(token);
                } else {
                    trace!(start = token.start, "token in inactive branch dropped");
                }
            }
        }
    }

    debug!(
        tokens = tokens.len(),
        comments = records.comments.len(),
        directives = records.directives.len(),
        "collection pass done"
    );
    Collected {
        tokens,
        records,
        fn_macros,
    }
}

fn handle_directive(
    source: &str,
    token: Token,
    defines: &mut FxHashSet<String>,
    fn_macros: &mut FxHashSet<String>,
    groups: &mut Vec<CondGroup>,
    records: &mut SourceRecords,
) {
    let line = &source[token.start as usize..token.end as usize];
    let (keyword, rest) = split_directive(line);
    let span = Span::new(token.start, token.end);
    let enclosing_active = groups.iter().all(|g| g.active);

    match keyword {
        "define" if enclosing_active => handle_define(rest, defines, fn_macros),
        "undef" if enclosing_active => {
            if let Some(name) = rest.split_whitespace().next() {
                defines.remove(name);
                fn_macros.remove(name);
            }
        }
        "if" | "ifdef" | "ifndef" => {
            let (kind, branch) = match keyword {
                "if" => (DirectiveKind::If, eval_condition(rest, defines)),
                "ifdef" => (
                    DirectiveKind::Ifdef,
                    rest.split_whitespace()
                        .next()
                        .is_some_and(|name| defines.contains(name)),
                ),
                _ => (
                    DirectiveKind::Ifndef,
                    !rest.split_whitespace()
                        .next()
                        .is_some_and(|name| defines.contains(name)),
                ),
            };
            let active = enclosing_active && branch;
            groups.push(CondGroup {
                any_taken: branch,
                active,
            });
            records.directives.push(DirectiveRecord { kind, span, taken: active });
        }
        "elif" | "else" => {
            let kind = if keyword == "elif" {
                DirectiveKind::Elif
            } else {
                DirectiveKind::Else
            };
            let condition = keyword != "elif" || eval_condition(rest, defines);
            let depth = groups.len();
            let enclosing = depth <= 1 || groups[..depth - 1].iter().all(|g| g.active);
            let taken = match groups.last_mut() {
                Some(group) => {
                    let branch = !group.any_taken && condition;
                    group.any_taken |= branch;
                    group.active = enclosing && branch;
                    group.active
                }
                // Stray branch switch with no open group; still recorded
                // so the region scan sees the full directive sequence.
                None => false,
            };
            records.directives.push(DirectiveRecord { kind, span, taken });
        }
        "endif" => {
            groups.pop();
            records.directives.push(DirectiveRecord {
                kind: DirectiveKind::Endif,
                span,
                taken: false,
            });
        }
        // include, pragma, error, line: no conditional structure, no record
        _ => {}
    }
}

/// Split `#  keyword rest` into keyword and argument text.
fn split_directive(line: &str) -> (&str, &str) {
    let body = line
        .trim_start()
        .trim_start_matches('#')
        .trim_start();
    match body.find(|c: char| c.is_whitespace()) {
        Some(end) => (&body[..end], body[end..].trim_start()),
        None => (body, ""),
    }
}

fn handle_define(
    rest: &str,
    defines: &mut FxHashSet<String>,
    fn_macros: &mut FxHashSet<String>,
) {
    let name_len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    if name_len == 0 {
        return;
    }
    let name = &rest[..name_len];
    // Function-style only when the paren hugs the name.
    if rest[name_len..].starts_with('(') {
        fn_macros.insert(name.to_string());
    }
    defines.insert(name.to_string());
}

/// Single-term `#if` evaluation: `!`, `defined(X)`, `defined X`, integer
/// literals, and bare names. Compound conditions evaluate their first
/// term; anything unrecognized reads as not taken.
fn eval_condition(expr: &str, defines: &FxHashSet<String>) -> bool {
    let expr = expr.trim();
    if let Some(rest) = expr.strip_prefix('!') {
        return !eval_condition(rest, defines);
    }
    if let Some(rest) = expr.strip_prefix("defined") {
        let name = rest
            .trim_start()
            .trim_start_matches('(')
            .trim_end_matches(')')
            .trim();
        return defines.contains(name);
    }
    if let Some(first) = expr.split_whitespace().next() {
        let digits = first.trim_end_matches(['L', 'l', 'U', 'u']);
        if let Ok(value) = digits.parse::<i64>() {
            return value != 0;
        }
        if !first.is_empty()
            && first
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return defines.contains(first);
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> FxHashSet<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn condition_forms() {
        let defines = set(&["FOO"]);
        assert!(eval_condition("1", &defines));
        assert!(!eval_condition("0", &defines));
        assert!(eval_condition("defined(FOO)", &defines));
        assert!(eval_condition("defined FOO", &defines));
        assert!(!eval_condition("defined(BAR)", &defines));
        assert!(eval_condition("!defined(BAR)", &defines));
        assert!(eval_condition("FOO", &defines));
        assert!(!eval_condition("BAR", &defines));
    }

    #[test]
    fn directive_splitting() {
        assert_eq!(split_directive("#define X 1"), ("define", "X 1"));
        assert_eq!(split_directive("#  if 0"), ("if", "0"));
        assert_eq!(split_directive("#endif"), ("endif", ""));
    }

    #[test]
    fn function_style_defines_need_hugging_paren() {
        let mut defines = FxHashSet::default();
        let mut fn_macros = FxHashSet::default();
        handle_define("F(a) ((a) + 1)", &mut defines, &mut fn_macros);
        handle_define("G (x)", &mut defines, &mut fn_macros);
        assert!(fn_macros.contains("F"));
        assert!(!fn_macros.contains("G"));
        assert!(defines.contains("G"));
    }
}
