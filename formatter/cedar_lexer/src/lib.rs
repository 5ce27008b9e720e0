//! Window re-lexing token stream for the Cedar formatter.
//!
//! The formatter never tokenizes a file once up front. It re-lexes
//! arbitrary sub-ranges of the original text on demand, because
//! backtracked layout attempts jump the scanner backwards and skip
//! regions jump it forwards. The contract this crate provides:
//!
//! - re-scanning the same window is deterministic
//! - whitespace, comments, and preprocessor lines are tokens, never
//!   auto-skipped
//! - malformed input (unterminated literals, stray bytes) is returned as
//!   a distinguished bad token, never as an error
//!
//! # Layers
//!
//! - [`SourceBuffer`]: sentinel-terminated byte copy of the source
//! - [`Cursor`]: byte cursor with memchr-accelerated scans
//! - [`Scanner`]: produces spanned [`Token`]s within a resettable window

mod cursor;
mod scanner;
mod source_buffer;
mod token;

pub use cursor::Cursor;
pub use scanner::Scanner;
pub use source_buffer::SourceBuffer;
pub use token::{Token, TokenKind};
