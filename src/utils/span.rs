//! Source location tracking
#![allow(dead_code)]

use std::fmt;

use serde::Serialize;

/// Position of a token in the source text (1-based line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    /// Create a new span
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Create a dummy span (for testing)
    pub fn dummy() -> Self {
        Self { line: 0, column: 0 }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::dummy()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}
