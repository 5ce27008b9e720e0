//! The traversal protocol.
//!
//! The walker drives the scribe over the tree. It owns the three defensive
//! guarantees the rules rely on: a node whose text was already emitted is
//! skipped, a node the pass cannot format is copied verbatim without
//! poisoning its siblings, and a rule that under-consumes its node still
//! leaves the frontier at the node's end. Rules never talk to the scanner
//! directly; everything flows through here or through the scribe.

use cedar_ir::SyntaxNode;
use cedar_lexer::TokenKind;
use tracing::{debug, trace};

use cedar_diagnostic::{bad_token, malformed_construct};

use crate::align::{AlignFlags, AlignSpec, TieBreak, WrapMode};
use crate::config::FormatConfig;
use crate::error::{Fmt, Interrupt};
use crate::rules::{self, needs_space_between};
use crate::scribe::{Scribe, TailAction};
use crate::skip::{SkipKind, SkipTable};

pub(crate) struct Walker<'a> {
    pub scribe: Scribe<'a>,
    pub config: &'a FormatConfig,
    skip: &'a SkipTable,
}

/// How a separated list is laid out and closed.
pub(crate) struct ListOptions {
    pub name: &'static str,
    pub mode: WrapMode,
    pub flags: AlignFlags,
    pub tie_break: TieBreak,
    pub close: Option<TokenKind>,
    /// Accept a trailing `, ...` variadic marker.
    pub allow_ellipsis: bool,
}

impl<'a> Walker<'a> {
    pub fn new(scribe: Scribe<'a>, config: &'a FormatConfig, skip: &'a SkipTable) -> Self {
        Walker {
            scribe,
            config,
            skip,
        }
    }

    /// Format one node: entry checks, rule dispatch, exit checks.
    pub fn format_node(&mut self, node: &SyntaxNode) -> Fmt<()> {
        if !self.enter_node(node)? {
            return Ok(());
        }
        (rules::rule_for(node.kind))(self, node)?;
        self.exit_node(node)
    }

    /// Decide whether the rule for `node` should run at all.
    fn enter_node(&mut self, node: &SyntaxNode) -> Fmt<bool> {
        if node.span.end <= self.scribe.position() {
            // A verbatim copy already ran past this node.
            trace!(kind = ?node.kind, "node already emitted, skipping");
            return Ok(false);
        }
        if node.from_expansion {
            debug!(kind = ?node.kind, "macro expansion site copied verbatim");
            self.scribe.print_comments()?;
            self.space_before_raw();
            self.scribe.print_raw(node.span.end)?;
            return Ok(false);
        }
        let covered = self
            .skip
            .region_at(node.span.start)
            .map(|region| region.kind != SkipKind::InactiveBranch)
            .unwrap_or(false);
        if covered {
            // Leading trivia formats normally; print_comments raw-copies
            // once the frontier enters the region itself.
            self.scribe.print_comments()?;
            if self.scribe.position() < node.span.end {
                self.space_before_raw();
                self.scribe.print_raw(node.span.end)?;
            }
            return Ok(false);
        }
        Ok(true)
    }

    /// Request the separating space a normal print would have decided on
    /// before a verbatim copy takes over.
    fn space_before_raw(&mut self) {
        let next = self.scribe.peek_significant().kind;
        if needs_space_between(self.config, self.scribe.last_kind(), next) {
            self.scribe.space();
        }
    }

    /// Completeness backstop: whatever the rule left unconsumed is copied
    /// verbatim so the frontier always lands on the node's end.
    fn exit_node(&mut self, node: &SyntaxNode) -> Fmt<()> {
        if self.scribe.position() < node.span.end {
            debug!(kind = ?node.kind, "rule under-consumed its node, copying tail");
            self.scribe.print_raw(node.span.end)?;
        }
        Ok(())
    }

    /// Format a run of sibling constructs, one per line, containing any
    /// member that turns out not to be formattable.
    pub fn format_block_items(&mut self, items: &[SyntaxNode]) -> Fmt<()> {
        for item in items {
            self.scribe.start_new_line();
            let checkpoint = self.scribe.checkpoint();
            match self.format_node(item) {
                Ok(()) => {
                    self.scribe.print_trailing_comment()?;
                }
                Err(Interrupt::NotFormattable { at }) => {
                    debug!(
                        offset = at.start,
                        "construct not formattable, copying verbatim"
                    );
                    self.scribe.restore(&checkpoint);
                    self.scribe.print_comments()?;
                    self.scribe.print_raw(item.span.end)?;
                    let diagnostic = if self.scribe.has_bad_token_in(at) {
                        bad_token(at)
                    } else {
                        malformed_construct(at)
                    };
                    self.scribe.add_diagnostic(diagnostic);
                }
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    /// Open an alignment frame, run `body`, and retry it from the frame's
    /// checkpoint whenever a wrap lands on this frame. Breaks for shallower
    /// frames pop this one and propagate with the depth decremented.
    pub fn with_alignment<F>(&mut self, spec: AlignSpec, mut body: F) -> Fmt<()>
    where
        F: FnMut(&mut Self) -> Fmt<()>,
    {
        let saved_tail = self.scribe.take_tail();
        self.scribe.open_alignment(&spec);
        loop {
            match body(self) {
                Ok(()) => break,
                Err(Interrupt::NeedsBreak { relative_depth }) => {
                    if relative_depth > 0 {
                        self.scribe.close_alignment();
                        return Err(Interrupt::NeedsBreak {
                            relative_depth: relative_depth - 1,
                        });
                    }
                    trace!(name = spec.name, "retrying with updated break marks");
                    self.scribe.retry_alignment();
                }
                Err(other) => {
                    self.scribe.close_alignment();
                    return Err(other);
                }
            }
        }
        self.scribe.close_alignment();
        self.scribe.set_tail_opt(saved_tail);
        Ok(())
    }

    /// Separator-joined fragments under one alignment frame, with the
    /// closing token run as the frame's tail action.
    pub fn format_list(&mut self, items: &[SyntaxNode], opts: &ListOptions) -> Fmt<()> {
        if items.is_empty() {
            if self.config.space_between_empty_parens {
                self.scribe.space();
            }
            if opts.allow_ellipsis
                && self.scribe.peek_significant().kind == TokenKind::Ellipsis
            {
                self.scribe.print_token(TokenKind::Ellipsis, false)?;
            }
            if let Some(close) = opts.close {
                self.scribe.print_token(close, false)?;
            }
            return Ok(());
        }
        let spec = AlignSpec {
            name: opts.name,
            mode: opts.mode,
            flags: opts.flags,
            tie_break: opts.tie_break,
            fragment_count: items.len(),
        };
        let space_before_sep = self.config.space_before_comma;
        let space_after_sep = self.config.space_after_comma;
        let close = opts.close;
        let allow_ellipsis = opts.allow_ellipsis;
        self.with_alignment(spec, |w| {
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    w.scribe.print_token(TokenKind::Comma, space_before_sep)?;
                }
                w.scribe.align_fragment(index > 0 && space_after_sep);
                if index + 1 == items.len() && !allow_ellipsis {
                    if let Some(close) = close {
                        w.scribe.set_tail(TailAction {
                            kind: close,
                            space_before: false,
                        });
                    }
                }
                w.format_node(item)?;
            }
            w.scribe.run_tail()?;
            if allow_ellipsis && w.scribe.peek_significant().kind == TokenKind::Comma {
                w.scribe.print_token(TokenKind::Comma, space_before_sep)?;
                if space_after_sep {
                    w.scribe.space();
                }
                w.scribe.print_token(TokenKind::Ellipsis, false)?;
            }
            if allow_ellipsis {
                if let Some(close) = close {
                    w.scribe.print_token(close, false)?;
                }
            }
            Ok(())
        })
    }

    /// Print every significant token up to `end`, spacing decided by the
    /// token-pair table. The workhorse behind token-driven rules.
    pub fn print_until(&mut self, end: u32, spaced: bool) -> Fmt<()> {
        loop {
            self.scribe.print_comments()?;
            let token = self.scribe.peek_significant();
            if token.kind == TokenKind::Eof || token.start >= end {
                break;
            }
            let space =
                spaced && needs_space_between(self.config, self.scribe.last_kind(), token.kind);
            self.scribe.print_any(space)?;
        }
        Ok(())
    }
}
