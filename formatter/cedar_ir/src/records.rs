//! Collaborator-supplied source records.
//!
//! The formatter does not run a preprocessor. The front end hands it
//! three record lists — macro expansions, conditional-compilation
//! directives (with taken flags), and comments — and the skip-region
//! table is derived from them before traversal starts.

use crate::Span;

/// One macro expansion site, resolved to its file span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacroExpansionRecord {
    /// Name of the referenced macro.
    pub name: String,
    /// File span of the expansion reference (name plus arguments).
    pub span: Span,
    /// Whether the macro is function-style (`F(a, b)`).
    pub function_style: bool,
    /// Parameter count for function-style macros.
    pub param_count: u32,
}

/// Conditional-compilation directive kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    If,
    Ifdef,
    Ifndef,
    Elif,
    Else,
    Endif,
}

impl DirectiveKind {
    /// Check if this directive opens a new conditional group.
    #[inline]
    pub fn opens_group(self) -> bool {
        matches!(
            self,
            DirectiveKind::If | DirectiveKind::Ifdef | DirectiveKind::Ifndef
        )
    }

    /// Check if this directive switches to a sibling branch.
    #[inline]
    pub fn is_branch_switch(self) -> bool {
        matches!(self, DirectiveKind::Elif | DirectiveKind::Else)
    }
}

/// One conditional directive with its resolved branch decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectiveRecord {
    pub kind: DirectiveKind,
    /// File span of the directive line itself.
    pub span: Span,
    /// Whether the branch this directive introduces was taken.
    /// Meaningless for `Endif`.
    pub taken: bool,
}

/// One comment with its file span.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CommentRecord {
    pub span: Span,
    /// `true` for `/* .. */`, `false` for `// ..`.
    pub block: bool,
}

/// The record bundle one formatting pass consumes.
///
/// All lists are ordered by span start.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceRecords {
    pub expansions: Vec<MacroExpansionRecord>,
    pub directives: Vec<DirectiveRecord>,
    pub comments: Vec<CommentRecord>,
}

impl SourceRecords {
    /// Create an empty record bundle (no preprocessor activity).
    pub fn empty() -> Self {
        SourceRecords::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_grouping() {
        assert!(DirectiveKind::If.opens_group());
        assert!(DirectiveKind::Ifndef.opens_group());
        assert!(!DirectiveKind::Else.opens_group());
        assert!(DirectiveKind::Elif.is_branch_switch());
        assert!(!DirectiveKind::Endif.is_branch_switch());
    }
}
