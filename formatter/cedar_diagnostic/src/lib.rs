//! Advisory diagnostics for the formatter.
//!
//! Formatting diagnostics never block a result: a pass either succeeds
//! with a best-effort edit list plus warnings, or aborts with no edits on
//! true desynchronization. What this crate provides:
//!
//! - stable codes for searchability
//! - clear messages (what went wrong)
//! - a primary span (where it went wrong)
//! - optional context labels (why)

mod diagnostic;

pub use diagnostic::{
    bad_token, malformed_construct, unexpected_token, DiagCode, Diagnostic, Label, Severity,
};
