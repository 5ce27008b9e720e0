use std::fmt;

use cedar_ir::Span;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// Stable diagnostic codes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DiagCode {
    /// The token stream did not match what the tree expected.
    UnexpectedToken,
    /// A construct could not be formatted and was copied verbatim.
    MalformedConstruct,
    /// A malformed token (unterminated literal) was encountered.
    BadToken,
}

impl DiagCode {
    /// Short stable code string.
    pub fn as_str(self) -> &'static str {
        match self {
            DiagCode::UnexpectedToken => "F0001",
            DiagCode::MalformedConstruct => "F0002",
            DiagCode::BadToken => "F0003",
        }
    }
}

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labeled span attached to a diagnostic.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    /// Primary label: where the problem is.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Label {
            span,
            message: message.into(),
        }
    }
}

/// One advisory diagnostic.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Diagnostic {
    pub code: DiagCode,
    pub severity: Severity,
    pub message: String,
    pub labels: Vec<Label>,
}

impl Diagnostic {
    /// Create a warning diagnostic.
    pub fn warning(code: DiagCode) -> Self {
        Diagnostic {
            code,
            severity: Severity::Warning,
            message: String::new(),
            labels: Vec::new(),
        }
    }

    /// Create an error diagnostic.
    pub fn error(code: DiagCode) -> Self {
        Diagnostic {
            code,
            severity: Severity::Error,
            message: String::new(),
            labels: Vec::new(),
        }
    }

    /// Set the main message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add a labeled span.
    #[must_use]
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Primary span, if any label was attached.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels.first().map(|l| l.span)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

/// Warning: a construct was copied verbatim because it could not be
/// formatted.
pub fn malformed_construct(span: Span) -> Diagnostic {
    Diagnostic::warning(DiagCode::MalformedConstruct)
        .with_message("construct could not be formatted and was left unchanged")
        .with_label(span, "copied verbatim")
}

/// Warning: a construct held a malformed token (unterminated literal,
/// stray byte) and was copied verbatim.
pub fn bad_token(span: Span) -> Diagnostic {
    Diagnostic::warning(DiagCode::BadToken)
        .with_message("malformed token; the construct was left unchanged")
        .with_label(span, "contains a malformed token")
}

/// Warning attached where the token stream diverged from the tree.
pub fn unexpected_token(span: Span, expected: &str, found: &str) -> Diagnostic {
    Diagnostic::warning(DiagCode::UnexpectedToken)
        .with_message(format!("expected {expected}, found {found}"))
        .with_label(span, "unexpected token")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_collects_labels() {
        let d = Diagnostic::warning(DiagCode::MalformedConstruct)
            .with_message("m")
            .with_label(Span::new(3, 7), "here");
        assert_eq!(d.primary_span(), Some(Span::new(3, 7)));
        assert_eq!(d.labels.len(), 1);
    }

    #[test]
    fn bad_token_carries_its_own_code() {
        let d = bad_token(Span::new(2, 6));
        assert_eq!(d.code, DiagCode::BadToken);
        assert_eq!(d.code.as_str(), "F0003");
    }

    #[test]
    fn display_includes_code() {
        let d = unexpected_token(Span::new(0, 1), "`;`", "`)`");
        assert_eq!(format!("{d}"), "warning[F0001]: expected `;`, found `)`");
    }
}
