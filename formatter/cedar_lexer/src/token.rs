//! Token kinds and spanned tokens.

use std::fmt;

/// Byte-range of a token in the original text.
///
/// Kept local to this crate so it stays dependency-free; the formatter
/// converts to its own span type at the boundary.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: u32,
    /// Exclusive end offset.
    pub end: u32,
}

impl Token {
    #[inline]
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Lexical token kinds for the C-family subset.
///
/// Trivia (whitespace, comments, preprocessor lines) are ordinary tokens;
/// the edit buffer decides what happens to them. Malformed input is
/// encoded as the `Unterminated*`/`InvalidByte` kinds, never as an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Trivia
    /// Run of spaces, tabs, carriage returns, and newlines.
    Whitespace,
    LineComment,
    BlockComment,
    /// A full preprocessor line (including backslash continuations),
    /// excluding the trailing newline.
    Preprocessor,

    // Names and literals
    Ident,
    Int,
    Float,
    CharLit,
    StringLit,

    // Keywords
    KwReturn,
    KwIf,
    KwElse,
    KwWhile,
    KwStruct,
    KwBreak,
    KwContinue,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Colon,
    Question,
    Dot,
    Arrow,
    Ellipsis,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Caret,
    Tilde,
    Bang,
    Assign,
    EqEq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    Shl,
    Shr,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    Inc,
    Dec,

    // Malformed input, returned as tokens so callers can abort gracefully
    UnterminatedString,
    UnterminatedChar,
    UnterminatedBlockComment,
    InvalidByte,

    Eof,
}

impl TokenKind {
    /// Whitespace, comments, and preprocessor lines.
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::LineComment
                | TokenKind::BlockComment
                | TokenKind::Preprocessor
        )
    }

    /// Comment tokens only.
    #[inline]
    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }

    /// Malformed-input tokens.
    #[inline]
    pub fn is_bad(self) -> bool {
        matches!(
            self,
            TokenKind::UnterminatedString
                | TokenKind::UnterminatedChar
                | TokenKind::UnterminatedBlockComment
                | TokenKind::InvalidByte
        )
    }

    /// Binary operators the expression rules wrap on.
    #[inline]
    pub fn is_binary_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::Amp
                | TokenKind::AmpAmp
                | TokenKind::Pipe
                | TokenKind::PipePipe
                | TokenKind::Caret
                | TokenKind::EqEq
                | TokenKind::NotEq
                | TokenKind::Less
                | TokenKind::Greater
                | TokenKind::LessEq
                | TokenKind::GreaterEq
                | TokenKind::Shl
                | TokenKind::Shr
        )
    }

    /// Shift operators (the outermost-first tie-break case).
    #[inline]
    pub fn is_shift_operator(self) -> bool {
        matches!(self, TokenKind::Shl | TokenKind::Shr)
    }

    /// Human-readable description for diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::LineComment => "line comment",
            TokenKind::BlockComment => "block comment",
            TokenKind::Preprocessor => "preprocessor directive",
            TokenKind::Ident => "identifier",
            TokenKind::Int => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::CharLit => "character literal",
            TokenKind::StringLit => "string literal",
            TokenKind::KwReturn => "`return`",
            TokenKind::KwIf => "`if`",
            TokenKind::KwElse => "`else`",
            TokenKind::KwWhile => "`while`",
            TokenKind::KwStruct => "`struct`",
            TokenKind::KwBreak => "`break`",
            TokenKind::KwContinue => "`continue`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Semi => "`;`",
            TokenKind::Colon => "`:`",
            TokenKind::Question => "`?`",
            TokenKind::Dot => "`.`",
            TokenKind::Arrow => "`->`",
            TokenKind::Ellipsis => "`...`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::Amp => "`&`",
            TokenKind::AmpAmp => "`&&`",
            TokenKind::Pipe => "`|`",
            TokenKind::PipePipe => "`||`",
            TokenKind::Caret => "`^`",
            TokenKind::Tilde => "`~`",
            TokenKind::Bang => "`!`",
            TokenKind::Assign => "`=`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Less => "`<`",
            TokenKind::Greater => "`>`",
            TokenKind::LessEq => "`<=`",
            TokenKind::GreaterEq => "`>=`",
            TokenKind::Shl => "`<<`",
            TokenKind::Shr => "`>>`",
            TokenKind::PlusAssign => "`+=`",
            TokenKind::MinusAssign => "`-=`",
            TokenKind::StarAssign => "`*=`",
            TokenKind::SlashAssign => "`/=`",
            TokenKind::Inc => "`++`",
            TokenKind::Dec => "`--`",
            TokenKind::UnterminatedString => "unterminated string literal",
            TokenKind::UnterminatedChar => "unterminated character literal",
            TokenKind::UnterminatedBlockComment => "unterminated block comment",
            TokenKind::InvalidByte => "invalid byte",
            TokenKind::Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}
