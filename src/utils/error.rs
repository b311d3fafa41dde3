//! Error handling for the C.SHORT front end

use crate::types::CType;
use crate::utils::Span;
use serde::Serialize;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Compiler error. The first one raised ends the analysis.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Lexical / Syntax Errors ====================

    #[error("syntax error at {span}: expected {expected}, found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("lexical error at {span}: {reason} '{lexeme}'")]
    InvalidToken {
        lexeme: String,
        reason: String,
        span: Span,
    },

    #[error("syntax error at {span}: function '{name}' declares more than {max} parameters")]
    TooManyParameters { name: String, max: usize, span: Span },

    // ==================== Semantic Errors ====================

    #[error("semantic error at {span}: {name}: {kind}")]
    Semantic {
        kind: SemanticErrorKind,
        name: String,
        span: Span,
    },
}

/// Message half of a semantic error; the identifier travels in `Error::Semantic`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemanticErrorKind {
    #[error("identifier not declared")]
    NotDeclared,

    #[error("identifier already declared in this scope")]
    Redeclaration,

    #[error("function already defined")]
    FunctionRedefined,

    #[error("identifier called as a function but it is not a function")]
    NotAFunction,

    #[error("function used as a variable")]
    FunctionAsVariable,

    #[error("identifier is not an array")]
    NotAnArray,

    #[error("void function cannot be used in an expression")]
    VoidInExpression,

    #[error("value of non-void function call is discarded")]
    UnusedResult,

    #[error("return type '{found}' does not match prototype return type '{expected}'")]
    ReturnTypeMismatch { expected: CType, found: CType },

    #[error("prototype declares {expected} parameter(s), definition declares {found}")]
    ParameterCountMismatch { expected: usize, found: usize },

    #[error("parameter {position} is '{found}' but prototype declares '{expected}'")]
    ParameterTypeMismatch {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("duplicate parameter name")]
    DuplicateParameter,

    #[error("void function cannot return a value")]
    VoidReturnsValue,

    #[error("non-void function must return a value")]
    MissingReturnValue,

    #[error("function must contain at least one return with a value")]
    MissingReturn,

    #[error("incompatible types in assignment: expected '{expected}', found '{found}'")]
    IncompatibleAssignment { expected: CType, found: CType },

    #[error("function expects {expected} argument(s), found {found}")]
    ArgumentCountMismatch { expected: usize, found: usize },

    #[error("argument {position} is '{found}' but parameter is '{expected}'")]
    ArgumentTypeMismatch {
        position: usize,
        expected: CType,
        found: CType,
    },

    #[error("symbol table capacity exhausted")]
    SymbolTableFull,
}

/// Analysis phase an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Lexical,
    Syntax,
    Semantic,
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. } => *span,
            Self::InvalidToken { span, .. } => *span,
            Self::TooManyParameters { span, .. } => *span,
            Self::Semantic { span, .. } => *span,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Self::InvalidToken { .. } => Phase::Lexical,
            Self::UnexpectedToken { .. } | Self::TooManyParameters { .. } => Phase::Syntax,
            Self::Semantic { .. } => Phase::Semantic,
        }
    }

    /// Identifier named by a semantic error
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::Semantic { name, .. } | Self::TooManyParameters { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Stable short code used in structured reports
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidToken { .. } => "E0001",
            Self::UnexpectedToken { .. } => "E0002",
            Self::TooManyParameters { .. } => "E0003",
            Self::Semantic { kind, .. } => match kind {
                SemanticErrorKind::NotDeclared => "E0100",
                SemanticErrorKind::Redeclaration => "E0101",
                SemanticErrorKind::FunctionRedefined => "E0102",
                SemanticErrorKind::NotAFunction => "E0103",
                SemanticErrorKind::FunctionAsVariable => "E0104",
                SemanticErrorKind::NotAnArray => "E0105",
                SemanticErrorKind::VoidInExpression => "E0106",
                SemanticErrorKind::UnusedResult => "E0107",
                SemanticErrorKind::ReturnTypeMismatch { .. } => "E0108",
                SemanticErrorKind::ParameterCountMismatch { .. } => "E0109",
                SemanticErrorKind::ParameterTypeMismatch { .. } => "E0110",
                SemanticErrorKind::DuplicateParameter => "E0111",
                SemanticErrorKind::VoidReturnsValue => "E0112",
                SemanticErrorKind::MissingReturnValue => "E0113",
                SemanticErrorKind::MissingReturn => "E0114",
                SemanticErrorKind::IncompatibleAssignment { .. } => "E0115",
                SemanticErrorKind::ArgumentCountMismatch { .. } => "E0116",
                SemanticErrorKind::ArgumentTypeMismatch { .. } => "E0117",
                SemanticErrorKind::SymbolTableFull => "E0118",
            },
        }
    }

    /// The semantic message kind, if this is a semantic error
    pub fn semantic_kind(&self) -> Option<&SemanticErrorKind> {
        match self {
            Self::Semantic { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_display_names_identifier() {
        let err = Error::Semantic {
            kind: SemanticErrorKind::Redeclaration,
            name: "x".to_string(),
            span: Span::new(1, 12),
        };
        assert_eq!(
            err.to_string(),
            "semantic error at line 1, column 12: x: identifier already declared in this scope"
        );
        assert_eq!(err.phase(), Phase::Semantic);
        assert_eq!(err.identifier(), Some("x"));
    }

    #[test]
    fn test_syntax_display() {
        let err = Error::UnexpectedToken {
            expected: "';'".to_string(),
            found: "}".to_string(),
            span: Span::new(3, 4),
        };
        assert_eq!(err.to_string(), "syntax error at line 3, column 4: expected ';', found '}'");
        assert_eq!(err.code(), "E0002");
    }
}
