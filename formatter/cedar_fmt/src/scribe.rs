//! The edit buffer.
//!
//! One scribe lives for one formatting pass. It walks the token stream in
//! lockstep with the traversal, deletes the trivia it passes, and inserts
//! the whitespace the rules ask for; the edit log coalesces the two sides
//! into minimal replacements. Printable tokens are never copied: output
//! text is always the original bytes plus whitespace gap edits.
//!
//! The scribe also owns the alignment stack and the rollback machinery.
//! [`Scribe::checkpoint`] captures everything a retry needs; restoring a
//! checkpoint rewinds the scanner, the scalar cursor state, and the edit
//! log tail in one step.

use cedar_diagnostic::Diagnostic;
use cedar_ir::Span;
use cedar_lexer::{Scanner, SourceBuffer, Token, TokenKind};
use tracing::{debug, trace};

use crate::align::{AlignFlags, AlignSpec, AlignmentFrame, AlignmentStack, WrapMode};
use crate::config::{FormatConfig, IndentStyle};
use crate::edit::{EditLog, EditSnapshot, TextEdit};
use crate::error::{Fmt, FormatError, Interrupt};
use crate::skip::SkipTable;

/// Deferred closing token, run by the construct that owns the line end so
/// the token participates in the enclosing alignment's column accounting.
#[derive(Copy, Clone, Debug)]
pub(crate) struct TailAction {
    pub kind: TokenKind,
    pub space_before: bool,
}

/// Relative-indent bookkeeping for contiguous runs of line comments. When
/// consecutive lines each carry a line comment, the run keeps its internal
/// column offsets even as the first comment is re-indented.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct LineCommentRun {
    contiguous: bool,
    source_column: u32,
    output_column: u32,
}

/// Everything needed to rewind a pass to an earlier frontier.
#[derive(Clone, Debug, Default)]
pub(crate) struct Checkpoint {
    offset: u32,
    line: u32,
    column: u32,
    indentation: u32,
    indent_count: u32,
    need_space: bool,
    pending_space: bool,
    newline_run: u32,
    needs_new_line: bool,
    last_kind: Option<TokenKind>,
    comment_run: LineCommentRun,
    tail: Option<TailAction>,
    edits: EditSnapshot,
}

pub(crate) struct Scribe<'a> {
    source: &'a str,
    scanner: Scanner<'a>,
    config: &'a FormatConfig,
    skip: &'a SkipTable,
    edits: EditLog,
    pub alignments: AlignmentStack,
    diagnostics: Vec<Diagnostic>,

    line: u32,
    /// Columns emitted on the current output line, tab stops applied.
    column: u32,
    /// Target column for [`Self::print_indent_if_necessary`].
    indentation: u32,
    indent_count: u32,
    need_space: bool,
    pending_space: bool,
    /// Newlines emitted since the last printable character.
    newline_run: u32,
    /// A line comment or preprocessor line was just emitted; the next
    /// token must not share its line.
    needs_new_line: bool,
    last_kind: Option<TokenKind>,
    comment_run: LineCommentRun,
    tail: Option<TailAction>,
}

impl<'a> Scribe<'a> {
    pub fn new(
        source: &'a str,
        buf: &'a SourceBuffer,
        config: &'a FormatConfig,
        skip: &'a SkipTable,
    ) -> Self {
        Scribe {
            source,
            scanner: Scanner::new(buf),
            config,
            skip,
            edits: EditLog::new(),
            alignments: AlignmentStack::new(),
            diagnostics: Vec::new(),
            line: 0,
            column: 0,
            indentation: 0,
            indent_count: 0,
            need_space: false,
            pending_space: false,
            newline_run: 0,
            needs_new_line: false,
            last_kind: None,
            comment_run: LineCommentRun::default(),
            tail: None,
        }
    }

    pub fn position(&self) -> u32 {
        self.scanner.position()
    }

    pub fn last_kind(&self) -> Option<TokenKind> {
        self.last_kind
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Consume the scribe at the end of a pass.
    pub fn into_output(self) -> (Vec<TextEdit>, Vec<Diagnostic>) {
        (self.edits.into_edits(), self.diagnostics)
    }

    // ---- checkpointing ---------------------------------------------------

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            offset: self.scanner.position(),
            line: self.line,
            column: self.column,
            indentation: self.indentation,
            indent_count: self.indent_count,
            need_space: self.need_space,
            pending_space: self.pending_space,
            newline_run: self.newline_run,
            needs_new_line: self.needs_new_line,
            last_kind: self.last_kind,
            comment_run: self.comment_run,
            tail: self.tail,
            edits: self.edits.snapshot(),
        }
    }

    pub fn restore(&mut self, checkpoint: &Checkpoint) {
        self.restart_at(checkpoint.offset);
        self.line = checkpoint.line;
        self.column = checkpoint.column;
        self.indentation = checkpoint.indentation;
        self.indent_count = checkpoint.indent_count;
        self.need_space = checkpoint.need_space;
        self.pending_space = checkpoint.pending_space;
        self.newline_run = checkpoint.newline_run;
        self.needs_new_line = checkpoint.needs_new_line;
        self.last_kind = checkpoint.last_kind;
        self.comment_run = checkpoint.comment_run;
        self.tail = checkpoint.tail;
        self.edits.restore(&checkpoint.edits);
    }

    /// Reconcile the scanner with a rewound frontier.
    pub fn restart_at(&mut self, offset: u32) {
        self.scanner.reset_to(offset, self.scanner.window_end());
    }

    // ---- indentation and spacing ----------------------------------------

    pub fn indent(&mut self) {
        self.indent_count += 1;
        self.indentation += self.config.indent_size;
    }

    pub fn unindent(&mut self) {
        self.indent_count = self.indent_count.saturating_sub(1);
        self.indentation = self.indentation.saturating_sub(self.config.indent_size);
    }

    pub fn indent_count(&self) -> u32 {
        self.indent_count
    }

    /// Request one space before the next printed token. No-op right after
    /// a line break or when a space was already requested.
    pub fn space(&mut self) {
        if !self.need_space {
            return;
        }
        self.newline_run = 0;
        self.pending_space = true;
        self.column += 1;
        self.need_space = false;
    }

    /// Break the line unless we are already at the start of one.
    pub fn start_new_line(&mut self) {
        if self.column > 0 {
            self.print_new_line_at(self.scanner.position());
        }
    }

    pub fn print_new_line_at(&mut self, pos: u32) {
        if self.newline_run >= 1 {
            self.column = 0;
            return;
        }
        let src = self.source.as_bytes();
        self.edits.insert(src, pos, "\n");
        self.line += 1;
        self.newline_run = 1;
        self.column = 0;
        self.need_space = false;
        self.pending_space = false;
        self.needs_new_line = false;
        self.comment_run.contiguous = false;
    }

    fn print_indent_if_necessary(&mut self, at: u32) {
        if self.column >= self.indentation {
            return;
        }
        let (text, column) = self.indent_string(self.column, self.indentation);
        if !text.is_empty() {
            let src = self.source.as_bytes();
            self.edits.insert(src, at, &text);
            self.column = column;
            self.pending_space = false;
        }
    }

    /// Indentation text from column `from` to column `to` under the
    /// configured style, with the column actually reached.
    fn indent_string(&self, from: u32, to: u32) -> (String, u32) {
        let mut text = String::new();
        let mut column = from;
        let tab = self.config.tab_size.max(1);
        match self.config.indent_style {
            IndentStyle::Spaces => {
                while column < to {
                    text.push(' ');
                    column += 1;
                }
            }
            IndentStyle::Tabs => {
                while (column / tab + 1) * tab <= to {
                    text.push('\t');
                    column = (column / tab + 1) * tab;
                }
                while column < to {
                    text.push(' ');
                    column += 1;
                }
            }
            IndentStyle::Mixed => {
                while column % tab == 0 && column + tab <= to {
                    text.push('\t');
                    column += tab;
                }
                while column < to {
                    text.push(' ');
                    column += 1;
                }
            }
        }
        (text, column)
    }

    // ---- printing --------------------------------------------------------

    /// Print the next significant token, which must have the given kind.
    pub fn print_token(&mut self, kind: TokenKind, space_before: bool) -> Fmt<()> {
        self.print_comments()?;
        let token = self.scanner.peek();
        if token.kind != kind {
            return Err(self.desync(kind.describe(), token));
        }
        self.scanner.next_token();
        self.print(token, space_before)
    }

    /// Like [`Self::print_token`] for a small set of acceptable kinds.
    pub fn print_token_one_of(&mut self, kinds: &[TokenKind], space_before: bool) -> Fmt<Token> {
        self.print_comments()?;
        let token = self.scanner.peek();
        if !kinds.contains(&token.kind) {
            return Err(self.desync("one of several token kinds", token));
        }
        self.scanner.next_token();
        self.print(token, space_before)?;
        Ok(token)
    }

    /// Print whatever significant token comes next.
    pub fn print_any(&mut self, space_before: bool) -> Fmt<Token> {
        self.print_comments()?;
        let token = self.scanner.peek();
        if token.kind == TokenKind::Eof {
            return Err(self.desync("a token", token));
        }
        self.scanner.next_token();
        self.print(token, space_before)?;
        Ok(token)
    }

    /// Next significant token without consuming anything.
    pub fn peek_significant(&mut self) -> Token {
        self.scanner.peek_significant()
    }

    /// Kind of the first significant token at or after `offset`, without
    /// disturbing the frontier. Used to pick wrap preferences before a
    /// construct's tokens are reached.
    pub fn classify_at(&mut self, offset: u32) -> TokenKind {
        let save = self.scanner.position();
        let end = self.scanner.window_end();
        self.scanner.reset_to(offset, end);
        let kind = self.scanner.peek_significant().kind;
        self.scanner.reset_to(save, end);
        kind
    }

    /// Whether `span` holds any malformed token. Decides which diagnostic
    /// a verbatim-copied construct gets.
    pub fn has_bad_token_in(&mut self, span: Span) -> bool {
        let save = self.scanner.position();
        let end = self.scanner.window_end();
        self.scanner.reset_to(span.start, end);
        let mut found = false;
        loop {
            let token = self.scanner.next_token();
            if token.kind == TokenKind::Eof || token.start >= span.end {
                break;
            }
            if token.kind.is_bad() {
                found = true;
                break;
            }
        }
        self.scanner.reset_to(save, end);
        found
    }

    fn desync(&self, expected: &'static str, found: Token) -> Interrupt {
        Interrupt::Abort(FormatError::Desynchronized {
            offset: found.start,
            expected,
            found: found.kind.describe().to_owned(),
        })
    }

    fn print(&mut self, token: Token, space_before: bool) -> Fmt<()> {
        if self.needs_new_line {
            if self.column > 0 {
                self.print_new_line_at(token.start);
            }
            self.needs_new_line = false;
        }
        let width = token.len();
        if self.column + width > self.config.page_width {
            self.handle_overflow()?;
        }
        self.newline_run = 0;
        self.comment_run.contiguous = false;
        self.print_indent_if_necessary(token.start);
        if space_before {
            self.space();
        }
        if self.pending_space {
            let src = self.source.as_bytes();
            self.edits.insert(src, token.start, " ");
        }
        self.pending_space = false;
        self.column += width;
        self.need_space = true;
        self.last_kind = Some(token.kind);
        Ok(())
    }

    fn handle_overflow(&mut self) -> Fmt<()> {
        if let Some(relative_depth) = self.alignments.choose_break() {
            self.alignments.mark_break(relative_depth);
            debug!(relative_depth, line = self.line, "line overflow, wrapping");
            return Err(Interrupt::NeedsBreak { relative_depth });
        }
        trace!(line = self.line, "line overflow accepted, nothing can break");
        Ok(())
    }

    // ---- trivia ----------------------------------------------------------

    /// Consume and resolve every piece of trivia before the next
    /// significant token: whitespace gaps, comments, preprocessor lines,
    /// and verbatim skip regions.
    pub fn print_comments(&mut self) -> Fmt<()> {
        let mut has_block_comment = false;
        loop {
            if let Some(end) = self
                .skip
                .verbatim_at(self.scanner.position())
                .map(|region| region.span.end)
            {
                debug!(
                    at = self.scanner.position(),
                    end, "copying verbatim region"
                );
                self.print_raw(end)?;
                continue;
            }
            let token = self.scanner.peek();
            if !token.kind.is_trivia() {
                break;
            }
            self.scanner.next_token();
            match token.kind {
                TokenKind::Whitespace => {
                    let lines = self.newline_count(token);
                    self.resolve_whitespace(token, lines, has_block_comment)?;
                    if lines > 1 {
                        self.comment_run.contiguous = false;
                    }
                }
                TokenKind::LineComment => {
                    self.print_line_comment(token);
                    has_block_comment = false;
                }
                TokenKind::BlockComment => {
                    self.print_block_comment(token);
                    has_block_comment = true;
                }
                TokenKind::Preprocessor => {
                    self.print_directive(token);
                    has_block_comment = false;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn newline_count(&self, token: Token) -> u32 {
        let text = &self.source.as_bytes()[token.start as usize..token.end as usize];
        u32::try_from(text.iter().filter(|&&b| b == b'\n').count()).unwrap_or(u32::MAX)
    }

    /// Rewrite one whitespace gap. Gaps without a newline are deleted (the
    /// next print decides spacing); structural breaks after line comments,
    /// block comments, and directives are re-emitted; plain breaks are
    /// joined, keeping blank lines up to the configured cap.
    fn resolve_whitespace(&mut self, token: Token, lines: u32, after_block: bool) -> Fmt<()> {
        let src = self.source.as_bytes();
        if lines == 0 {
            self.edits.delete(src, token.start, token.len());
            return Ok(());
        }
        let at_eof = self.scanner.peek().kind == TokenKind::Eof;
        if self.needs_new_line || after_block || at_eof {
            let text = self.forced_break_text(lines - 1);
            self.edits.replace(src, token.start, token.len(), &text);
            self.needs_new_line = false;
            return Ok(());
        }
        let blank = lines - 1;
        let keep = blank.min(self.config.blank_lines_to_preserve);
        if keep == 0 {
            // Join; layout decisions re-insert breaks where they belong.
            self.edits.delete(src, token.start, token.len());
        } else {
            let text = self.empty_lines_text(keep);
            self.edits.replace(src, token.start, token.len(), &text);
        }
        Ok(())
    }

    /// A break that must appear: one newline plus up to `blank` preserved
    /// blank lines.
    fn forced_break_text(&mut self, blank: u32) -> String {
        let keep = blank.min(self.config.blank_lines_to_preserve);
        if keep > 0 {
            self.empty_lines_text(keep)
        } else {
            self.new_line_text()
        }
    }

    fn new_line_text(&mut self) -> String {
        if self.newline_run >= 1 {
            self.column = 0;
            return String::new();
        }
        self.line += 1;
        self.newline_run = 1;
        self.column = 0;
        self.need_space = false;
        self.pending_space = false;
        String::from("\n")
    }

    /// Enough newlines for `blank` blank lines, counting those already
    /// emitted.
    fn empty_lines_text(&mut self, blank: u32) -> String {
        let wanted = blank + 1;
        let missing = wanted.saturating_sub(self.newline_run);
        self.column = 0;
        if missing == 0 {
            return String::new();
        }
        self.line += missing;
        self.newline_run += missing;
        self.need_space = false;
        self.pending_space = false;
        "\n".repeat(missing as usize)
    }

    fn print_line_comment(&mut self, token: Token) {
        let src_column = self.source_column(token.start);
        let output_column;
        if self.newline_run == 0 {
            // Trailing position: keep it on the current line.
            self.space();
            output_column = self.column;
            self.flush_pending_space(token.start);
        } else {
            output_column = if self.comment_run.contiguous {
                shifted_column(
                    self.comment_run.output_column,
                    self.comment_run.source_column,
                    src_column,
                )
            } else {
                self.indentation
            };
            if output_column > 0 {
                let (text, column) = self.indent_string(0, output_column);
                let src = self.source.as_bytes();
                self.edits.insert(src, token.start, &text);
                self.column = column;
            }
            self.pending_space = false;
        }
        // Comment bytes stay verbatim.
        self.column += token.len();
        self.newline_run = 0;
        self.need_space = false;
        self.needs_new_line = true;
        self.last_kind = Some(TokenKind::LineComment);
        self.comment_run = LineCommentRun {
            contiguous: true,
            source_column: src_column,
            output_column,
        };
    }

    fn print_block_comment(&mut self, token: Token) {
        if self.newline_run >= 1 {
            self.print_indent_if_necessary(token.start);
        } else {
            self.space();
        }
        self.flush_pending_space(token.start);
        let text = &self.source[token.start as usize..token.end as usize];
        self.advance_over_text(text);
        self.need_space = true;
        self.comment_run.contiguous = false;
        self.last_kind = Some(TokenKind::BlockComment);
    }

    /// Preprocessor lines own their line and keep their own text; only the
    /// breaks around them are enforced.
    fn print_directive(&mut self, token: Token) {
        if self.column > 0 {
            self.print_new_line_at(token.start);
        }
        self.pending_space = false;
        let text = &self.source[token.start as usize..token.end as usize];
        self.advance_over_text(text);
        self.need_space = false;
        self.needs_new_line = true;
        self.comment_run.contiguous = false;
        self.last_kind = Some(TokenKind::Preprocessor);
    }

    fn flush_pending_space(&mut self, at: u32) {
        if self.pending_space {
            let src = self.source.as_bytes();
            self.edits.insert(src, at, " ");
            self.pending_space = false;
        }
    }

    /// A comment or directive on the current line, printed before any
    /// structural newline so it stays attached to what it annotates.
    pub fn print_trailing_comment(&mut self) -> Fmt<()> {
        let save = self.scanner.position();
        let mut token = self.scanner.peek();
        let mut gap: Option<Token> = None;
        if token.kind == TokenKind::Whitespace {
            if self.newline_count(token) > 0 {
                return Ok(());
            }
            self.scanner.next_token();
            gap = Some(token);
            token = self.scanner.peek();
        }
        if !token.kind.is_comment() {
            self.restart_at(save);
            return Ok(());
        }
        if let Some(gap) = gap {
            let src = self.source.as_bytes();
            self.edits.delete(src, gap.start, gap.len());
        }
        self.scanner.next_token();
        match token.kind {
            TokenKind::LineComment => {
                self.space();
                self.flush_pending_space(token.start);
                self.column += token.len();
                self.newline_run = 0;
                self.need_space = false;
                self.needs_new_line = true;
                self.comment_run.contiguous = false;
                self.last_kind = Some(TokenKind::LineComment);
            }
            _ => self.print_block_comment(token),
        }
        Ok(())
    }

    // ---- verbatim copy ---------------------------------------------------

    /// Copy everything up to `end` untouched. A verbatim copy is the
    /// absence of edits; tokens are still replayed so line, column, and
    /// brace-implied indentation stay honest for what follows.
    pub fn print_raw(&mut self, end: u32) -> Fmt<()> {
        self.flush_pending_space(self.scanner.position());
        self.need_space = false;
        while self.scanner.position() < end {
            let token = self.scanner.peek();
            if token.kind == TokenKind::Eof {
                break;
            }
            self.scanner.next_token();
            match token.kind {
                TokenKind::LBrace => self.indent(),
                TokenKind::RBrace => self.unindent(),
                _ => {}
            }
            let stop = token.end.min(end);
            let text = &self.source[token.start as usize..stop as usize];
            self.advance_over_text(text);
            if token.end > end {
                self.restart_at(end);
                break;
            }
        }
        self.needs_new_line = false;
        self.comment_run.contiguous = false;
        self.last_kind = None;
        Ok(())
    }

    fn advance_over_text(&mut self, text: &str) {
        let tab = self.config.tab_size.max(1);
        for byte in text.bytes() {
            match byte {
                b'\n' => {
                    self.line += 1;
                    self.column = 0;
                    self.newline_run += 1;
                }
                b'\r' => {}
                b'\t' => {
                    self.column = (self.column / tab + 1) * tab;
                    self.newline_run = 0;
                }
                _ => {
                    self.column += 1;
                    self.newline_run = 0;
                }
            }
        }
    }

    /// Finish the pass: resolve trailing trivia after the last construct.
    pub fn finish(&mut self) -> Fmt<()> {
        self.print_comments()
    }

    fn source_column(&self, offset: u32) -> u32 {
        let bytes = self.source.as_bytes();
        let mut start = offset as usize;
        while start > 0 && bytes[start - 1] != b'\n' {
            start -= 1;
        }
        let tab = self.config.tab_size.max(1);
        let mut column = 0u32;
        for &byte in &bytes[start..offset as usize] {
            if byte == b'\t' {
                column = (column / tab + 1) * tab;
            } else {
                column += 1;
            }
        }
        column
    }

    // ---- tail actions ----------------------------------------------------

    pub fn set_tail(&mut self, action: TailAction) {
        debug_assert!(self.tail.is_none(), "tail action already pending");
        self.tail = Some(action);
    }

    pub fn set_tail_opt(&mut self, action: Option<TailAction>) {
        self.tail = action;
    }

    pub fn take_tail(&mut self) -> Option<TailAction> {
        self.tail.take()
    }

    /// Run the pending tail action, if any.
    pub fn run_tail(&mut self) -> Fmt<()> {
        if let Some(action) = self.tail.take() {
            self.print_token(action.kind, action.space_before)?;
        }
        Ok(())
    }

    // ---- alignment -------------------------------------------------------

    pub fn open_alignment(&mut self, spec: &AlignSpec) {
        let entry_indent = self.indentation;
        let mut flags = spec.flags;
        // Multi-column layout is a column anchor by definition.
        if spec.mode == WrapMode::MultiColumn {
            flags |= AlignFlags::INDENT_ON_COLUMN;
        }
        let mut break_indent = if flags.contains(AlignFlags::INDENT_ON_COLUMN) {
            self.column
        } else if flags.contains(AlignFlags::INDENT_BY_ONE) {
            entry_indent + self.config.indent_size
        } else {
            entry_indent + self.config.continuation_columns()
        };
        if spec.mode == WrapMode::NextLineShifted {
            break_indent += self.config.indent_size;
        }
        trace!(
            name = spec.name,
            fragments = spec.fragment_count,
            break_indent,
            "opening alignment"
        );
        let checkpoint = self.checkpoint();
        self.alignments
            .push(AlignmentFrame::new(spec, break_indent, entry_indent, checkpoint));
    }

    pub fn close_alignment(&mut self) {
        if let Some(frame) = self.alignments.pop() {
            self.indentation = frame.entry_indent;
        }
    }

    /// Rewind to the innermost frame's creation point for another attempt.
    /// Break marks survive; fragment counters restart.
    pub fn retry_alignment(&mut self) {
        let checkpoint = match self.alignments.innermost() {
            Some(frame) => frame.checkpoint.clone(),
            None => return,
        };
        self.restore(&checkpoint);
        if let Some(frame) = self.alignments.innermost_mut() {
            frame.reset_run();
        }
    }

    /// Begin the next fragment of the innermost alignment: break the line
    /// if this fragment is marked, otherwise optionally separate it with a
    /// space.
    pub fn align_fragment(&mut self, space_if_inline: bool) {
        let (broken, break_indent, first) = match self.alignments.innermost_mut() {
            Some(frame) => {
                let index = frame.begin_fragment();
                (frame.is_broken(index), frame.break_indent, index == 0)
            }
            None => return,
        };
        if broken {
            self.start_new_line();
            self.indentation = break_indent;
        } else if !first && space_if_inline {
            self.space();
        }
    }
}

fn shifted_column(prev_output: u32, prev_source: u32, source: u32) -> u32 {
    let delta = i64::from(source) - i64::from(prev_source);
    let shifted = i64::from(prev_output) + delta;
    u32::try_from(shifted.max(0)).unwrap_or(0)
}

#[cfg(test)]
mod tests;
