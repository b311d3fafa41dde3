//! Structured Feedback Module
//!
//! Machine-readable output of an analysis run (`--json`):
//! - the first error, with a stable code and a fix hint
//! - the final symbol table, zombies included

use serde::Serialize;

use crate::frontend::symbols::{Symbol, SymbolTable};
use crate::utils::{Error, Phase, Result, SemanticErrorKind};

// ==================== Structured Error Report ====================

/// A structured error report
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    /// Error code (e.g., "E0101")
    pub code: String,

    pub phase: Phase,

    /// Human-readable message
    pub message: String,

    /// Identifier named by a semantic error
    pub identifier: Option<String>,

    pub location: Location,

    /// Suggested fix, when one is obvious
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

// ==================== Analysis Report ====================

/// Complete result of one run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub file: String,
    pub success: bool,
    pub error: Option<ErrorReport>,
    pub symbols: Vec<Symbol>,
}

impl AnalysisReport {
    pub fn new(file_name: &str, result: &Result<()>, symbols: &SymbolTable) -> Self {
        Self {
            file: file_name.to_string(),
            success: result.is_ok(),
            error: result.as_ref().err().map(|e| ErrorReport::from_error(e, file_name)),
            symbols: symbols.iter().cloned().collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ==================== Error Conversion ====================

impl ErrorReport {
    /// Create an error report from a compiler error
    pub fn from_error(error: &Error, file_name: &str) -> Self {
        let span = error.span();
        Self {
            code: error.code().to_string(),
            phase: error.phase(),
            message: error.to_string(),
            identifier: error.identifier().map(str::to_string),
            location: Location {
                file: file_name.to_string(),
                line: span.line,
                column: span.column,
            },
            hint: hint_for(error),
        }
    }
}

fn hint_for(error: &Error) -> Option<String> {
    let hint = match error {
        Error::InvalidToken { .. } => "remove or escape the offending character",
        Error::TooManyParameters { .. } => "pass an array instead of many scalars",
        Error::UnexpectedToken { expected, .. } if expected == "';'" => "add a ';'",
        Error::UnexpectedToken { .. } => return None,
        Error::Semantic { kind, name, .. } => {
            return match kind {
                SemanticErrorKind::NotDeclared => Some(format!("declare '{}' before using it", name)),
                SemanticErrorKind::Redeclaration => Some(format!("rename one of the '{}' declarations", name)),
                SemanticErrorKind::MissingReturn | SemanticErrorKind::MissingReturnValue => {
                    Some(format!("return a value from '{}'", name))
                }
                SemanticErrorKind::VoidReturnsValue => Some("use 'return;' in a void function".to_string()),
                SemanticErrorKind::UnusedResult => Some(format!("assign the result of '{}' to a variable", name)),
                SemanticErrorKind::ReturnTypeMismatch { .. }
                | SemanticErrorKind::ParameterCountMismatch { .. }
                | SemanticErrorKind::ParameterTypeMismatch { .. } => {
                    Some(format!("make the definition of '{}' match its prototype", name))
                }
                _ => None,
            };
        }
    };
    Some(hint.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::parser::Parser;

    fn report(source: &str) -> AnalysisReport {
        let mut parser = Parser::new(Lexer::new(source));
        let result = parser.parse_program();
        AnalysisReport::new("test.csh", &result, parser.symbols())
    }

    #[test]
    fn test_success_report() {
        let report = report("int v[3]; void f(int &a){ a = v[0]; }");
        assert!(report.success);
        assert!(report.error.is_none());

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["symbols"][0]["name"], "v");
        assert_eq!(json["symbols"][0]["ty"], "int[]");
        assert_eq!(json["symbols"][0]["kind"], "array");
        assert_eq!(json["symbols"][2]["state"], "zombie");
        assert_eq!(json["symbols"][1]["params"][0]["by_ref"], true);
    }

    #[test]
    fn test_error_report() {
        let report = report("int x;\nint x;");
        assert!(!report.success);

        let error = report.error.unwrap();
        assert_eq!(error.code, "E0101");
        assert_eq!(error.phase, Phase::Semantic);
        assert_eq!(error.identifier.as_deref(), Some("x"));
        assert_eq!(error.location.line, 2);
        assert_eq!(error.location.column, 5);
        assert!(error.hint.unwrap().contains("rename"));
    }

    #[test]
    fn test_syntax_error_hint() {
        let error = report("int x").error.unwrap();
        assert_eq!(error.phase, Phase::Syntax);
        assert_eq!(error.hint.as_deref(), Some("add a ';'"));
    }
}
