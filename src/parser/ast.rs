// Parse tree definitions for the validated constructs

use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Byte range in the source text (half-open)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `offset`
    pub fn point(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both `self` and `other`
    pub fn join(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Grammar categories a syntactic unit can belong to.
///
/// The first five are the constructs under validation; `Statement` covers the
/// simple statements (assignments, increments, calls, `return`) that may
/// appear inside blocks and between constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstructKind {
    Declaration,
    ArrayDeclaration,
    IfElse,
    While,
    Function,
    Statement,
}

impl ConstructKind {
    /// Human-readable name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            ConstructKind::Declaration => "declaration",
            ConstructKind::ArrayDeclaration => "array declaration",
            ConstructKind::IfElse => "if-else statement",
            ConstructKind::While => "while loop",
            ConstructKind::Function => "function declaration",
            ConstructKind::Statement => "statement",
        }
    }
}

impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A successfully matched construct
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructNode {
    pub kind: ConstructKind,
    /// Declared name for declarations and functions
    pub name: Option<String>,
    pub location: SourceLocation,
    pub span: Span,
    /// Indices of the matched tokens in the parser's token stream
    pub tokens: Range<usize>,
    /// Constructs nested in the body blocks
    pub children: Vec<ConstructNode>,
}

impl ConstructNode {
    /// Number of constructs in this subtree, including `self`
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ConstructNode::count).sum::<usize>()
    }
}
