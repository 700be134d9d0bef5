//! Source positions and spans.
//!
//! Every token, AST node and error carries a [`Span`] so diagnostics can point
//! back at the exact slice of source text that produced them.

use serde::Serialize;
use std::fmt;

/// A single point in the source buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Position {
    /// Byte offset into the source.
    pub idx: usize,

    /// 1‑based line number.
    pub line: usize,

    /// 1‑based column (in bytes).
    pub col: usize,
}

impl Position {
    pub const fn new(idx: usize, line: usize, col: usize) -> Self {
        Self { idx, line, col }
    }
}

/// Half-open range `[start, end)` of source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Span from the start of `self` to the end of `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}:{}", self.start.line, self.start.col)
    }
}
