//! Recursive-descent parser over the collected token stream.
//!
//! The tree is deliberately coarse: operators, names, and punctuation
//! stay in the source text, and the formatter re-encounters them with
//! its own scanner. Children exist only where layout needs a handle —
//! operand chains, argument lists, block items. Anything the grammar
//! cannot place becomes a `Problem` node spanning up to the next `;` at
//! brace depth zero, an enclosing `}`, or a token that starts a fresh
//! line and looks like a new construct.

use cedar_ir::{MacroExpansionRecord, NodeKind, Span, SyntaxNode};
use cedar_lexer::{Token, TokenKind};
use rustc_hash::FxHashSet;
use tracing::debug;

pub(crate) struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    fn_macros: &'a FxHashSet<String>,
    pos: usize,
    expansions: Vec<MacroExpansionRecord>,
}

impl<'a> Parser<'a> {
    pub fn new(
        source: &'a str,
        tokens: &'a [Token],
        fn_macros: &'a FxHashSet<String>,
    ) -> Self {
        Parser {
            source,
            tokens,
            fn_macros,
            pos: 0,
            expansions: Vec::new(),
        }
    }

    pub fn translation_unit(&mut self) -> SyntaxNode {
        let mut children = Vec::new();
        while self.peek() != TokenKind::Eof {
            children.push(self.top_level());
        }
        let span = match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => Span::new(first.start, last.end),
            _ => Span::DUMMY,
        };
        debug!(nodes = children.len(), "translation unit parsed");
        SyntaxNode::new(NodeKind::TranslationUnit, span, children)
    }

    /// Expansion records in span order, consuming the parser.
    pub fn into_expansions(mut self) -> Vec<MacroExpansionRecord> {
        self.expansions.sort_by_key(|record| record.span.start);
        self.expansions
    }

    // ---- token access -------------------------------------------------

    fn peek(&self) -> TokenKind {
        self.peek_kind_at(0)
    }

    fn peek_kind_at(&self, ahead: usize) -> TokenKind {
        self.tokens
            .get(self.pos + ahead)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn bump(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek() == kind {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Span covering tokens `start..self.pos`.
    fn span_from(&self, start: usize) -> Span {
        if start >= self.pos {
            return Span::DUMMY;
        }
        match (self.tokens.get(start), self.tokens.get(self.pos - 1)) {
            (Some(first), Some(last)) => Span::new(first.start, last.end),
            _ => Span::DUMMY,
        }
    }

    fn text_of(&self, span: Span) -> &'a str {
        &self.source[span.to_range()]
    }

    /// Whether the token at `index` is the first on its line (trivia
    /// between tokens is gone from the stream, so look at the raw gap).
    fn starts_fresh_line(&self, index: usize) -> bool {
        let Some(token) = self.tokens.get(index) else {
            return false;
        };
        let gap_start = match index.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(prev) => prev.end,
            None => 0,
        };
        self.source[gap_start as usize..token.start as usize].contains('\n')
    }

    // ---- declarations -------------------------------------------------

    fn top_level(&mut self) -> SyntaxNode {
        match self.peek() {
            TokenKind::KwStruct | TokenKind::Ident => self.declaration_or_function(),
            _ => self.problem(self.pos),
        }
    }

    fn declaration_or_function(&mut self) -> SyntaxNode {
        let start = self.pos;
        // Specifiers and declarator names up to the first structural token.
        while matches!(
            self.peek(),
            TokenKind::KwStruct | TokenKind::Ident | TokenKind::Star
        ) {
            self.bump();
        }
        if self.pos == start {
            return self.problem(start);
        }
        match self.peek() {
            TokenKind::LParen => self.function_tail(start),
            TokenKind::Assign | TokenKind::Comma => self.init_declarators(start),
            TokenKind::Semi => {
                self.bump();
                SyntaxNode::leaf(NodeKind::Declaration, self.span_from(start))
            }
            TokenKind::LBrace => self.struct_body_tail(start),
            _ => self.problem(start),
        }
    }

    /// `= init` declarator tails, comma-separated. Initializers are the
    /// node's children; names and commas stay in the stream.
    fn init_declarators(&mut self, start: usize) -> SyntaxNode {
        let mut children = Vec::new();
        loop {
            if self.eat(TokenKind::Assign) {
                children.push(self.expr());
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
            while matches!(self.peek(), TokenKind::Star | TokenKind::Ident) {
                self.bump();
            }
        }
        if !self.eat(TokenKind::Semi) {
            return self.problem(start);
        }
        SyntaxNode::new(NodeKind::Declaration, self.span_from(start), children)
    }

    fn function_tail(&mut self, start: usize) -> SyntaxNode {
        let Some(params) = self.param_list() else {
            return self.problem(start);
        };
        match self.peek() {
            TokenKind::LBrace => {
                let body = self.compound();
                SyntaxNode::new(
                    NodeKind::FunctionDef,
                    self.span_from(start),
                    vec![params, body],
                )
            }
            TokenKind::Semi => {
                self.bump();
                SyntaxNode::new(NodeKind::Declaration, self.span_from(start), vec![params])
            }
            _ => self.problem(start),
        }
    }

    /// `(` params `)`, parens included in the span. `None` when the list
    /// never closes.
    fn param_list(&mut self) -> Option<SyntaxNode> {
        let start = self.pos;
        self.bump(); // (
        let mut params = Vec::new();
        while !matches!(self.peek(), TokenKind::RParen | TokenKind::Eof) {
            if self.peek() == TokenKind::Ellipsis {
                self.bump();
                break;
            }
            let param_start = self.pos;
            while !matches!(
                self.peek(),
                TokenKind::Comma | TokenKind::RParen | TokenKind::Eof
            ) {
                self.bump();
            }
            if self.pos > param_start {
                params.push(SyntaxNode::leaf(NodeKind::Param, self.span_from(param_start)));
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        if !self.eat(TokenKind::RParen) {
            return None;
        }
        Some(SyntaxNode::new(
            NodeKind::ParamList,
            self.span_from(start),
            params,
        ))
    }

    /// `struct S { .. } [names] ;` with the body as a compound child.
    fn struct_body_tail(&mut self, start: usize) -> SyntaxNode {
        let body = self.compound();
        let failed = body.kind == NodeKind::Problem;
        while matches!(self.peek(), TokenKind::Star | TokenKind::Ident) {
            self.bump();
        }
        if failed || !self.eat(TokenKind::Semi) {
            return self.problem(start);
        }
        SyntaxNode::new(NodeKind::Declaration, self.span_from(start), vec![body])
    }

    // ---- statements ---------------------------------------------------

    fn statement(&mut self) -> SyntaxNode {
        match self.peek() {
            TokenKind::LBrace => self.compound(),
            TokenKind::KwReturn => self.return_stmt(),
            TokenKind::KwIf => self.if_stmt(),
            TokenKind::KwWhile => self.while_stmt(),
            TokenKind::KwBreak | TokenKind::KwContinue => {
                let start = self.pos;
                self.bump();
                if !self.eat(TokenKind::Semi) {
                    return self.problem(start);
                }
                SyntaxNode::leaf(NodeKind::ExprStmt, self.span_from(start))
            }
            _ if self.at_local_declaration() => self.declaration_or_function(),
            _ => self.expr_stmt(),
        }
    }

    /// Statement-position declaration lookahead. `T x`, `struct ..`, and
    /// the `T *p` form with a clear declarator tail; `x * y;` stays an
    /// expression.
    fn at_local_declaration(&self) -> bool {
        match self.peek() {
            TokenKind::KwStruct => true,
            TokenKind::Ident => match self.peek_kind_at(1) {
                TokenKind::Ident => true,
                TokenKind::Star => {
                    self.peek_kind_at(2) == TokenKind::Ident
                        && matches!(
                            self.peek_kind_at(3),
                            TokenKind::Assign | TokenKind::Semi | TokenKind::Comma
                        )
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn compound(&mut self) -> SyntaxNode {
        let start = self.pos;
        self.bump(); // {
        let mut items = Vec::new();
        while !matches!(self.peek(), TokenKind::RBrace | TokenKind::Eof) {
            items.push(self.statement());
        }
        if !self.eat(TokenKind::RBrace) {
            // Unterminated block: surrender the whole thing.
            return SyntaxNode::leaf(NodeKind::Problem, self.span_from(start));
        }
        SyntaxNode::new(NodeKind::CompoundStmt, self.span_from(start), items)
    }

    fn return_stmt(&mut self) -> SyntaxNode {
        let start = self.pos;
        self.bump();
        let mut children = Vec::new();
        if self.peek() != TokenKind::Semi {
            children.push(self.expr());
        }
        if !self.eat(TokenKind::Semi) {
            return self.problem(start);
        }
        SyntaxNode::new(NodeKind::ReturnStmt, self.span_from(start), children)
    }

    /// Children `[cond, then]` or `[cond, then, else]`; the condition span
    /// excludes the parens so they print from the stream.
    fn if_stmt(&mut self) -> SyntaxNode {
        let start = self.pos;
        self.bump();
        if !self.eat(TokenKind::LParen) {
            return self.problem(start);
        }
        let cond = self.expr();
        if !self.eat(TokenKind::RParen) {
            return self.problem(start);
        }
        let then = self.statement();
        let mut children = vec![cond, then];
        if self.eat(TokenKind::KwElse) {
            children.push(self.statement());
        }
        SyntaxNode::new(NodeKind::IfStmt, self.span_from(start), children)
    }

    fn while_stmt(&mut self) -> SyntaxNode {
        let start = self.pos;
        self.bump();
        if !self.eat(TokenKind::LParen) {
            return self.problem(start);
        }
        let cond = self.expr();
        if !self.eat(TokenKind::RParen) {
            return self.problem(start);
        }
        let body = self.statement();
        SyntaxNode::new(NodeKind::WhileStmt, self.span_from(start), vec![cond, body])
    }

    fn expr_stmt(&mut self) -> SyntaxNode {
        let start = self.pos;
        let expr = self.expr();
        if !self.eat(TokenKind::Semi) {
            return self.problem(start);
        }
        SyntaxNode::new(NodeKind::ExprStmt, self.span_from(start), vec![expr])
    }

    /// Consume to a recovery point and produce a `Problem` leaf. Always
    /// makes progress, even on an immediate stray `}`.
    fn problem(&mut self, start: usize) -> SyntaxNode {
        let mut depth = 0u32;
        while self.peek() != TokenKind::Eof {
            match self.peek() {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                TokenKind::Semi if depth == 0 => {
                    self.bump();
                    break;
                }
                kind if depth == 0 && self.pos > start && self.recovery_anchor(kind) => {
                    break;
                }
                _ => {}
            }
            self.bump();
        }
        if self.pos == start && self.pos < self.tokens.len() {
            self.pos += 1;
        }
        debug!(span = ?self.span_from(start), "unparsable region");
        SyntaxNode::leaf(NodeKind::Problem, self.span_from(start))
    }

    /// A fresh-line token that clearly starts a new construct.
    fn recovery_anchor(&self, kind: TokenKind) -> bool {
        if !self.starts_fresh_line(self.pos) {
            return false;
        }
        match kind {
            TokenKind::KwStruct
            | TokenKind::KwIf
            | TokenKind::KwWhile
            | TokenKind::KwReturn
            | TokenKind::KwBreak
            | TokenKind::KwContinue => true,
            TokenKind::Ident => self.peek_kind_at(1) == TokenKind::Ident,
            _ => false,
        }
    }

    // ---- expressions --------------------------------------------------

    fn expr(&mut self) -> SyntaxNode {
        self.binary(0)
    }

    /// Precedence climbing with same-level flattening: `a + b - c` is one
    /// `BinaryExpr` with three operand children.
    fn binary(&mut self, min_level: u8) -> SyntaxNode {
        let mut lhs = self.unary();
        while let Some(level) = precedence(self.peek()) {
            if level < min_level {
                break;
            }
            let mut operands = vec![lhs];
            while precedence(self.peek()) == Some(level) {
                self.bump();
                operands.push(self.binary(level + 1));
            }
            let span = operands
                .iter()
                .map(|node| node.span)
                .reduce(|a, b| a.merge(b))
                .unwrap_or(Span::DUMMY);
            lhs = SyntaxNode::new(NodeKind::BinaryExpr, span, operands);
        }
        lhs
    }

    fn unary(&mut self) -> SyntaxNode {
        match self.peek() {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Bang
            | TokenKind::Tilde
            | TokenKind::Star
            | TokenKind::Amp
            | TokenKind::Inc
            | TokenKind::Dec => {
                let start = self.pos;
                self.bump();
                let operand = self.unary();
                SyntaxNode::new(NodeKind::ParenExpr, self.span_from(start), vec![operand])
            }
            _ => self.postfix(),
        }
    }

    /// Calls, member access, indexing, and postfix `++`/`--`. Non-call
    /// postfix forms wrap the base in an extended-span `ParenExpr` whose
    /// trailing tokens print from the stream.
    fn postfix(&mut self) -> SyntaxNode {
        let start = self.pos;
        let mut node = self.primary();
        loop {
            match self.peek() {
                TokenKind::LParen => {
                    self.bump();
                    let mut children = vec![node];
                    if self.peek() != TokenKind::RParen {
                        loop {
                            children.push(self.expr());
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    if !self.eat(TokenKind::RParen) {
                        return SyntaxNode::leaf(NodeKind::Problem, self.span_from(start));
                    }
                    let span = self.span_from(start);
                    let macro_name = children
                        .first()
                        .filter(|callee| callee.kind == NodeKind::NameRef)
                        .map(|callee| self.text_of(callee.span))
                        .filter(|name| self.fn_macros.contains(*name));
                    let arg_count = children.len() - 1;
                    node = SyntaxNode::new(NodeKind::CallExpr, span, children);
                    if let Some(name) = macro_name {
                        self.expansions.push(MacroExpansionRecord {
                            name: name.to_string(),
                            span,
                            function_style: true,
                            param_count: u32::try_from(arg_count).unwrap_or(u32::MAX),
                        });
                        node = node.with_expansion();
                    }
                }
                TokenKind::Dot | TokenKind::Arrow
                    if self.peek_kind_at(1) == TokenKind::Ident =>
                {
                    self.bump();
                    self.bump();
                    node = SyntaxNode::new(
                        NodeKind::ParenExpr,
                        self.span_from(start),
                        vec![node],
                    );
                }
                TokenKind::LBracket => {
                    self.bump();
                    let index = self.expr();
                    if !self.eat(TokenKind::RBracket) {
                        return SyntaxNode::leaf(NodeKind::Problem, self.span_from(start));
                    }
                    node = SyntaxNode::new(
                        NodeKind::ParenExpr,
                        self.span_from(start),
                        vec![node, index],
                    );
                }
                TokenKind::Inc | TokenKind::Dec => {
                    self.bump();
                    node = SyntaxNode::new(
                        NodeKind::ParenExpr,
                        self.span_from(start),
                        vec![node],
                    );
                }
                _ => break,
            }
        }
        node
    }

    fn primary(&mut self) -> SyntaxNode {
        let start = self.pos;
        match self.peek() {
            TokenKind::LParen => {
                self.bump();
                let inner = self.expr();
                if !self.eat(TokenKind::RParen) {
                    return SyntaxNode::leaf(NodeKind::Problem, self.span_from(start));
                }
                SyntaxNode::new(NodeKind::ParenExpr, self.span_from(start), vec![inner])
            }
            TokenKind::Ident => {
                self.bump();
                SyntaxNode::leaf(NodeKind::NameRef, self.span_from(start))
            }
            TokenKind::Int | TokenKind::Float | TokenKind::CharLit | TokenKind::StringLit => {
                self.bump();
                SyntaxNode::leaf(NodeKind::Literal, self.span_from(start))
            }
            _ => {
                // Not an expression head; swallow one token so the caller
                // always advances, and let containment handle the rest.
                self.bump();
                SyntaxNode::leaf(NodeKind::Problem, self.span_from(start))
            }
        }
    }
}

fn precedence(kind: TokenKind) -> Option<u8> {
    use TokenKind::*;
    Some(match kind {
        Assign | PlusAssign | MinusAssign | StarAssign | SlashAssign => 1,
        PipePipe => 2,
        AmpAmp => 3,
        Pipe => 4,
        Caret => 5,
        Amp => 6,
        EqEq | NotEq => 7,
        Less | Greater | LessEq | GreaterEq => 8,
        Shl | Shr => 9,
        Plus | Minus => 10,
        Star | Slash | Percent => 11,
        _ => return None,
    })
}
