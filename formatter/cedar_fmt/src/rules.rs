//! Per-construct formatting rules and the kind dispatch table.
//!
//! Rules decide layout; the walker and the scribe do everything else. Most
//! constructs are token-driven: the rule prints the node's own tokens
//! through the spacing table and recurses into structured children where
//! they appear. Constructs that can wrap (operator chains, argument and
//! parameter lists) open alignment frames instead.

use cedar_ir::{NodeKind, SyntaxNode};
use cedar_lexer::TokenKind;

use crate::align::{AlignFlags, AlignSpec, TieBreak, WrapMode};
use crate::config::FormatConfig;
use crate::error::{Fmt, Interrupt};
use crate::traverse::{ListOptions, Walker};

pub(crate) type Rule = fn(&mut Walker<'_>, &SyntaxNode) -> Fmt<()>;

/// Kind-to-rule dispatch. Every kind has exactly one entry; adding a kind
/// without extending this table is a compile error.
pub(crate) fn rule_for(kind: NodeKind) -> Rule {
    match kind {
        NodeKind::TranslationUnit => translation_unit,
        NodeKind::Declaration
        | NodeKind::FunctionDef
        | NodeKind::Param
        | NodeKind::ExprStmt
        | NodeKind::ReturnStmt
        | NodeKind::IfStmt
        | NodeKind::WhileStmt
        | NodeKind::ParenExpr
        | NodeKind::NameRef
        | NodeKind::Literal => token_driven,
        NodeKind::ParamList => param_list,
        NodeKind::CompoundStmt => compound_stmt,
        NodeKind::BinaryExpr => binary_expr,
        NodeKind::CallExpr => call_expr,
        NodeKind::Problem => problem,
    }
}

fn translation_unit(w: &mut Walker<'_>, node: &SyntaxNode) -> Fmt<()> {
    w.format_block_items(&node.children)
}

/// The generic rule: print the node's own tokens through the spacing
/// table, recursing into each structured child where it begins.
fn token_driven(w: &mut Walker<'_>, node: &SyntaxNode) -> Fmt<()> {
    for child in &node.children {
        w.print_until(child.span.start, true)?;
        w.format_node(child)?;
    }
    w.print_until(node.span.end, true)
}

fn param_list(w: &mut Walker<'_>, node: &SyntaxNode) -> Fmt<()> {
    w.scribe.print_token(TokenKind::LParen, false)?;
    let opts = ListOptions {
        name: "parameters",
        mode: w.config.wrap_parameters,
        flags: w.config.wrap_indent_parameters,
        tie_break: TieBreak::Innermost,
        close: Some(TokenKind::RParen),
        allow_ellipsis: true,
    };
    w.format_list(&node.children, &opts)
}

fn compound_stmt(w: &mut Walker<'_>, node: &SyntaxNode) -> Fmt<()> {
    w.scribe.print_token(TokenKind::LBrace, true)?;
    w.scribe.indent();
    w.format_block_items(&node.children)?;
    w.scribe.unindent();
    w.scribe.start_new_line();
    w.scribe.print_token(TokenKind::RBrace, false)
}

const CHAIN_OPERATORS: &[TokenKind] = &[
    TokenKind::Plus,
    TokenKind::Minus,
    TokenKind::Star,
    TokenKind::Slash,
    TokenKind::Percent,
    TokenKind::Amp,
    TokenKind::AmpAmp,
    TokenKind::Pipe,
    TokenKind::PipePipe,
    TokenKind::Caret,
    TokenKind::EqEq,
    TokenKind::NotEq,
    TokenKind::Less,
    TokenKind::Greater,
    TokenKind::LessEq,
    TokenKind::GreaterEq,
    TokenKind::Shl,
    TokenKind::Shr,
    TokenKind::Assign,
    TokenKind::PlusAssign,
    TokenKind::MinusAssign,
    TokenKind::StarAssign,
    TokenKind::SlashAssign,
];

/// A flattened same-precedence chain: operands are children, operators are
/// re-encountered in the token stream. Wraps break before the operator.
/// Shift chains prefer the outermost frame so stream-style output splits
/// at the `<<`s, not inside the pieces.
fn binary_expr(w: &mut Walker<'_>, node: &SyntaxNode) -> Fmt<()> {
    if node.children.len() < 2 {
        return token_driven(w, node);
    }
    let operator = w.scribe.classify_at(node.children[0].span.end);
    let tie_break = if operator.is_shift_operator() {
        TieBreak::Outermost
    } else {
        TieBreak::Innermost
    };
    let spec = AlignSpec {
        name: "operator_chain",
        mode: WrapMode::CompactSplit,
        flags: AlignFlags::empty(),
        tie_break,
        fragment_count: node.children.len(),
    };
    let spaced = w.config.space_around_binary_operators;
    w.with_alignment(spec, |w| {
        for (index, operand) in node.children.iter().enumerate() {
            if index > 0 {
                w.scribe.align_fragment(spaced);
                w.scribe.print_token_one_of(CHAIN_OPERATORS, false)?;
                if spaced {
                    w.scribe.space();
                }
            } else {
                w.scribe.align_fragment(false);
            }
            w.format_node(operand)?;
        }
        Ok(())
    })
}

fn call_expr(w: &mut Walker<'_>, node: &SyntaxNode) -> Fmt<()> {
    let Some((callee, args)) = node.children.split_first() else {
        return token_driven(w, node);
    };
    w.format_node(callee)?;
    w.scribe.print_token(TokenKind::LParen, false)?;
    let opts = ListOptions {
        name: "arguments",
        mode: w.config.wrap_arguments,
        flags: w.config.wrap_indent_arguments,
        tie_break: TieBreak::Innermost,
        close: Some(TokenKind::RParen),
        allow_ellipsis: false,
    };
    w.format_list(args, &opts)
}

fn problem(_w: &mut Walker<'_>, node: &SyntaxNode) -> Fmt<()> {
    Err(Interrupt::NotFormattable { at: node.span })
}

/// Token-pair spacing for token-driven printing. Binary-operator spacing
/// inside chains is handled explicitly by [`binary_expr`]; here operators
/// read as prefix or declarator position.
pub(crate) fn needs_space_between(
    config: &FormatConfig,
    prev: Option<TokenKind>,
    next: TokenKind,
) -> bool {
    use TokenKind::*;
    let Some(prev) = prev else {
        return false;
    };
    let word = |kind: TokenKind| {
        matches!(
            kind,
            Ident
                | Int
                | Float
                | CharLit
                | StringLit
                | KwReturn
                | KwIf
                | KwElse
                | KwWhile
                | KwStruct
                | KwBreak
                | KwContinue
        )
    };
    let assign = |kind: TokenKind| {
        matches!(
            kind,
            Assign | PlusAssign | MinusAssign | StarAssign | SlashAssign
        )
    };
    match next {
        Semi | RParen | RBracket | Dot | Arrow | Inc | Dec | LBracket => return false,
        Comma => return config.space_before_comma,
        LParen => {
            return matches!(prev, KwIf | KwWhile | KwReturn | KwElse)
                || assign(prev)
                || prev == Comma
        }
        LBrace => return true,
        _ => {}
    }
    match prev {
        LParen | LBracket | Bang | Tilde | Dot | Arrow | Inc | Dec => return false,
        // Prefix or declarator position.
        Minus | Plus | Star | Amp => return false,
        Comma => return config.space_after_comma,
        Semi => return true,
        _ => {}
    }
    if assign(prev) || assign(next) {
        return true;
    }
    // Words detach from whatever follows: another word, a declarator star,
    // a prefix operator after `return`.
    if word(prev) {
        return true;
    }
    matches!(next, Question | Colon) || matches!(prev, Question | Colon | RParen | RBrace)
}
