//! Frontend module - Lexer, Parser, Symbol Table, Semantic Analysis

pub mod token;
pub mod lexer;
pub mod token_stream;
pub mod symbols;
pub mod semantic;
pub mod parser;

#[cfg(test)]
mod tests {
    use super::lexer::Lexer;
    use super::parser::Parser;
    use super::symbols::{Liveness, Scope, SymbolKind};
    use crate::utils::{Error, SemanticErrorKind, Span};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sort_demo() {
        let mut parser = Parser::new(Lexer::new(include_str!("../../demos/sort.csh")));
        parser.parse_program().unwrap();
        let symbols = parser.symbols();

        let functions: Vec<(&str, bool, usize)> = symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Function)
            .map(|s| (s.name.as_str(), s.defined, s.param_count()))
            .collect();
        assert_eq!(
            functions,
            vec![("swap", true, 2), ("smallest", true, 3), ("sort", true, 0)]
        );
        assert!(symbols
            .iter()
            .filter(|s| s.scope == Scope::Local)
            .all(|s| s.state == Liveness::Zombie));
    }

    #[test]
    fn test_text_demo() {
        let mut parser = Parser::new(Lexer::new(include_str!("../../demos/text.csh")));
        assert!(parser.parse_program().is_ok());
    }

    #[test]
    fn test_missing_return_demo() {
        let mut parser = Parser::new(Lexer::new(include_str!("../../demos/missing_return.csh")));
        let err = parser.parse_program().unwrap_err();
        assert!(matches!(
            err,
            Error::Semantic { kind: SemanticErrorKind::MissingReturn, ref name, span }
                if name == "sign" && span == Span::new(3, 1)
        ));
    }
}
