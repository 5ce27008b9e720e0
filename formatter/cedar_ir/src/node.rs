//! The generic syntax tree walked by the formatter.
//!
//! Nodes carry no payload beyond kind, span, and children: operator
//! tokens, names, and punctuation stay in the source text and are
//! re-encountered by the formatter's own scanner. A node whose text
//! derives from a macro expansion carries `from_expansion`; its span is
//! the resolved file span of the expansion reference.

use crate::Span;

/// Node kinds for the exercised C-family subset.
///
/// `Problem` is the parse-error placeholder: the formatter contains it to
/// one sibling and copies its bytes verbatim.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    TranslationUnit,
    /// `type name [= initializer] ;`
    Declaration,
    FunctionDef,
    ParamList,
    Param,
    CompoundStmt,
    ExprStmt,
    ReturnStmt,
    IfStmt,
    WhileStmt,
    /// A flattened same-precedence operator chain; children are the
    /// operands, operators remain in the token stream.
    BinaryExpr,
    CallExpr,
    ParenExpr,
    NameRef,
    Literal,
    /// Parse-error placeholder spanning the unparsable region.
    Problem,
}

impl NodeKind {
    /// Check if this kind is an expression.
    #[inline]
    pub fn is_expr(self) -> bool {
        matches!(
            self,
            NodeKind::BinaryExpr
                | NodeKind::CallExpr
                | NodeKind::ParenExpr
                | NodeKind::NameRef
                | NodeKind::Literal
        )
    }

    /// Check if this kind is a statement.
    #[inline]
    pub fn is_stmt(self) -> bool {
        matches!(
            self,
            NodeKind::CompoundStmt
                | NodeKind::ExprStmt
                | NodeKind::ReturnStmt
                | NodeKind::IfStmt
                | NodeKind::WhileStmt
        )
    }
}

/// One node of the generic tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    /// True file span (expansion indirections are resolved by the parser).
    pub span: Span,
    /// Whether the node's text derives from a macro expansion.
    pub from_expansion: bool,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Create a leaf node.
    pub fn leaf(kind: NodeKind, span: Span) -> Self {
        SyntaxNode {
            kind,
            span,
            from_expansion: false,
            children: Vec::new(),
        }
    }

    /// Create an interior node; the span must cover all children.
    pub fn new(kind: NodeKind, span: Span, children: Vec<SyntaxNode>) -> Self {
        SyntaxNode {
            kind,
            span,
            from_expansion: false,
            children,
        }
    }

    /// Mark the node as macro-derived.
    #[must_use]
    pub fn with_expansion(mut self) -> Self {
        self.from_expansion = true;
        self
    }

    /// Depth-first count of nodes, including self.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SyntaxNode::node_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn node_count_counts_self_and_children() {
        let node = SyntaxNode::new(
            NodeKind::BinaryExpr,
            Span::new(0, 5),
            vec![
                SyntaxNode::leaf(NodeKind::Literal, Span::new(0, 1)),
                SyntaxNode::leaf(NodeKind::Literal, Span::new(4, 5)),
            ],
        );
        assert_eq!(node.node_count(), 3);
    }

    #[test]
    fn kind_classification() {
        assert!(NodeKind::BinaryExpr.is_expr());
        assert!(!NodeKind::BinaryExpr.is_stmt());
        assert!(NodeKind::ExprStmt.is_stmt());
        assert!(!NodeKind::Problem.is_expr());
    }
}
