//! Hand-written scanner producing spanned tokens.
//!
//! The scanner operates on a [`Cursor`] within a resettable window. Each
//! dispatch arm is a focused method that advances the cursor and returns
//! the finished token. Keywords are resolved here (there is no separate
//! cooking layer; the formatter consumes tokens directly).

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};
use crate::SourceBuffer;

/// Window re-lexing scanner.
///
/// Re-scanning the same window always yields the same token sequence;
/// there is no internal state beyond the cursor position.
pub struct Scanner<'a> {
    cursor: Cursor<'a>,
    buf: &'a SourceBuffer,
}

impl<'a> Scanner<'a> {
    /// Create a scanner over the whole buffer.
    pub fn new(buf: &'a SourceBuffer) -> Self {
        Scanner {
            cursor: Cursor::new(buf),
            buf,
        }
    }

    /// Reposition the scanner to a byte window.
    pub fn reset_to(&mut self, start: u32, end: u32) {
        self.cursor.reset_to(start, end);
    }

    /// Offset of the next unscanned byte.
    #[inline]
    pub fn position(&self) -> u32 {
        self.cursor.pos()
    }

    /// Exclusive end of the current window.
    #[inline]
    pub fn window_end(&self) -> u32 {
        self.cursor.window_end()
    }

    /// Non-consuming look at the next token.
    pub fn peek(&mut self) -> Token {
        let save = self.cursor.pos();
        let token = self.next_token();
        self.cursor.reset_to(save, self.cursor.window_end());
        token
    }

    /// Non-consuming look at the next non-trivia token.
    pub fn peek_significant(&mut self) -> Token {
        let save = self.cursor.pos();
        let token = loop {
            let t = self.next_token();
            if !t.kind.is_trivia() {
                break t;
            }
        };
        self.cursor.reset_to(save, self.cursor.window_end());
        token
    }

    /// Produce the next token.
    ///
    /// Returns an empty `Eof` token at the window end; subsequent calls
    /// keep returning `Eof`.
    pub fn next_token(&mut self) -> Token {
        let start = self.cursor.pos();
        if self.cursor.at_end() {
            return self.finish(start, TokenKind::Eof);
        }
        match self.cursor.current() {
            b' ' | b'\t' | b'\r' | b'\n' => self.whitespace(start),
            b'/' => self.slash(start),
            b'#' => self.hash(start),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(start),
            b'0'..=b'9' => self.number(start),
            b'"' => self.string_lit(start),
            b'\'' => self.char_lit(start),
            b'(' => self.single(start, TokenKind::LParen),
            b')' => self.single(start, TokenKind::RParen),
            b'{' => self.single(start, TokenKind::LBrace),
            b'}' => self.single(start, TokenKind::RBrace),
            b'[' => self.single(start, TokenKind::LBracket),
            b']' => self.single(start, TokenKind::RBracket),
            b',' => self.single(start, TokenKind::Comma),
            b';' => self.single(start, TokenKind::Semi),
            b':' => self.single(start, TokenKind::Colon),
            b'?' => self.single(start, TokenKind::Question),
            b'.' => self.dot(start),
            b'+' => self.plus(start),
            b'-' => self.minus(start),
            b'*' => self.maybe_assign(start, TokenKind::Star, TokenKind::StarAssign),
            b'%' => self.single(start, TokenKind::Percent),
            b'&' => self.double_or(start, b'&', TokenKind::AmpAmp, TokenKind::Amp),
            b'|' => self.double_or(start, b'|', TokenKind::PipePipe, TokenKind::Pipe),
            b'^' => self.single(start, TokenKind::Caret),
            b'~' => self.single(start, TokenKind::Tilde),
            b'!' => self.maybe_assign(start, TokenKind::Bang, TokenKind::NotEq),
            b'=' => self.maybe_assign(start, TokenKind::Assign, TokenKind::EqEq),
            b'<' => self.angle(start, b'<', TokenKind::Less, TokenKind::LessEq, TokenKind::Shl),
            b'>' => self.angle(start, b'>', TokenKind::Greater, TokenKind::GreaterEq, TokenKind::Shr),
            _ => self.single(start, TokenKind::InvalidByte),
        }
    }

    // ── dispatch arms ──────────────────────────────────────────────────

    fn whitespace(&mut self, start: u32) -> Token {
        while matches!(self.cursor.current(), b' ' | b'\t' | b'\r' | b'\n') && !self.cursor.at_end()
        {
            self.cursor.bump();
        }
        self.finish(start, TokenKind::Whitespace)
    }

    fn slash(&mut self, start: u32) -> Token {
        match self.cursor.peek() {
            b'/' => {
                self.cursor.advance_to_byte2(b'\n', b'\r');
                self.finish(start, TokenKind::LineComment)
            }
            b'*' => {
                self.cursor.bump_n(2);
                loop {
                    self.cursor.advance_to_byte(b'*');
                    if self.cursor.at_end() {
                        return self.finish(start, TokenKind::UnterminatedBlockComment);
                    }
                    if self.cursor.peek() == b'/' {
                        self.cursor.bump_n(2);
                        return self.finish(start, TokenKind::BlockComment);
                    }
                    self.cursor.bump();
                }
            }
            b'=' => {
                self.cursor.bump_n(2);
                self.finish(start, TokenKind::SlashAssign)
            }
            _ => self.single(start, TokenKind::Slash),
        }
    }

    /// `#` at a line start opens a preprocessor line running to the next
    /// unescaped newline (backslash continuations included, the newline
    /// itself excluded). Anywhere else a `#` is a stray byte.
    fn hash(&mut self, start: u32) -> Token {
        if !self.cursor.at_line_start(start) {
            return self.single(start, TokenKind::InvalidByte);
        }
        loop {
            self.cursor.advance_to_byte2(b'\\', b'\n');
            match self.cursor.current() {
                b'\\' => {
                    // Continuation: skip the backslash and the line break.
                    self.cursor.bump();
                    if self.cursor.current() == b'\r' {
                        self.cursor.bump();
                    }
                    if self.cursor.current() == b'\n' {
                        self.cursor.bump();
                    }
                }
                _ => break, // newline (not consumed) or window end
            }
        }
        self.finish(start, TokenKind::Preprocessor)
    }

    fn identifier(&mut self, start: u32) -> Token {
        while matches!(self.cursor.current(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.cursor.bump();
        }
        let kind = match &self.buf.bytes()[start as usize..self.cursor.pos() as usize] {
            b"return" => TokenKind::KwReturn,
            b"if" => TokenKind::KwIf,
            b"else" => TokenKind::KwElse,
            b"while" => TokenKind::KwWhile,
            b"struct" => TokenKind::KwStruct,
            b"break" => TokenKind::KwBreak,
            b"continue" => TokenKind::KwContinue,
            _ => TokenKind::Ident,
        };
        self.finish(start, kind)
    }

    fn number(&mut self, start: u32) -> Token {
        if self.cursor.current() == b'0' && matches!(self.cursor.peek(), b'x' | b'X') {
            self.cursor.bump_n(2);
            while self.cursor.current().is_ascii_hexdigit() {
                self.cursor.bump();
            }
            return self.finish(start, TokenKind::Int);
        }
        while self.cursor.current().is_ascii_digit() {
            self.cursor.bump();
        }
        let mut kind = TokenKind::Int;
        if self.cursor.current() == b'.' && self.cursor.peek().is_ascii_digit() {
            self.cursor.bump();
            while self.cursor.current().is_ascii_digit() {
                self.cursor.bump();
            }
            kind = TokenKind::Float;
        }
        // Integer/float suffixes (u, l, f combinations)
        while matches!(
            self.cursor.current(),
            b'u' | b'U' | b'l' | b'L' | b'f' | b'F'
        ) {
            self.cursor.bump();
        }
        self.finish(start, kind)
    }

    fn string_lit(&mut self, start: u32) -> Token {
        self.quoted(start, b'"', TokenKind::StringLit, TokenKind::UnterminatedString)
    }

    fn char_lit(&mut self, start: u32) -> Token {
        self.quoted(start, b'\'', TokenKind::CharLit, TokenKind::UnterminatedChar)
    }

    /// A literal is unterminated at a raw newline or at the window end;
    /// the partial token is returned so the caller can abort gracefully.
    fn quoted(&mut self, start: u32, quote: u8, ok: TokenKind, bad: TokenKind) -> Token {
        self.cursor.bump();
        loop {
            if self.cursor.at_end() {
                return self.finish(start, bad);
            }
            match self.cursor.current() {
                b'\n' => return self.finish(start, bad),
                b'\\' => self.cursor.bump_n(2),
                b if b == quote => {
                    self.cursor.bump();
                    return self.finish(start, ok);
                }
                _ => self.cursor.bump(),
            }
        }
    }

    fn dot(&mut self, start: u32) -> Token {
        if self.cursor.peek() == b'.' && self.cursor.peek2() == b'.' {
            self.cursor.bump_n(3);
            return self.finish(start, TokenKind::Ellipsis);
        }
        self.single(start, TokenKind::Dot)
    }

    fn plus(&mut self, start: u32) -> Token {
        match self.cursor.peek() {
            b'+' => {
                self.cursor.bump_n(2);
                self.finish(start, TokenKind::Inc)
            }
            b'=' => {
                self.cursor.bump_n(2);
                self.finish(start, TokenKind::PlusAssign)
            }
            _ => self.single(start, TokenKind::Plus),
        }
    }

    fn minus(&mut self, start: u32) -> Token {
        match self.cursor.peek() {
            b'-' => {
                self.cursor.bump_n(2);
                self.finish(start, TokenKind::Dec)
            }
            b'=' => {
                self.cursor.bump_n(2);
                self.finish(start, TokenKind::MinusAssign)
            }
            b'>' => {
                self.cursor.bump_n(2);
                self.finish(start, TokenKind::Arrow)
            }
            _ => self.single(start, TokenKind::Minus),
        }
    }

    /// `<` / `>` family: bare, `<=`/`>=`, or `<<`/`>>`.
    fn angle(&mut self, start: u32, ch: u8, bare: TokenKind, eq: TokenKind, shift: TokenKind) -> Token {
        match self.cursor.peek() {
            b'=' => {
                self.cursor.bump_n(2);
                self.finish(start, eq)
            }
            b if b == ch => {
                self.cursor.bump_n(2);
                self.finish(start, shift)
            }
            _ => self.single(start, bare),
        }
    }

    fn maybe_assign(&mut self, start: u32, bare: TokenKind, with_eq: TokenKind) -> Token {
        if self.cursor.peek() == b'=' {
            self.cursor.bump_n(2);
            self.finish(start, with_eq)
        } else {
            self.single(start, bare)
        }
    }

    fn double_or(&mut self, start: u32, ch: u8, double: TokenKind, bare: TokenKind) -> Token {
        if self.cursor.peek() == ch {
            self.cursor.bump_n(2);
            self.finish(start, double)
        } else {
            self.single(start, bare)
        }
    }

    fn single(&mut self, start: u32, kind: TokenKind) -> Token {
        self.cursor.bump();
        self.finish(start, kind)
    }

    #[inline]
    fn finish(&self, start: u32, kind: TokenKind) -> Token {
        Token {
            kind,
            start,
            end: self.cursor.pos(),
        }
    }
}
