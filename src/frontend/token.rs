//! Token definitions for C.SHORT
#![allow(dead_code)]

use std::fmt;

use crate::utils::Span;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw source text, truncated to `MAX_LEXEME_LEN` characters
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self { kind, lexeme: lexeme.into(), span }
    }

    pub fn eof(span: Span) -> Self {
        Self { kind: TokenKind::Eof, lexeme: String::from("EOF"), span }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ============ Keywords ============
    /// int
    Int,
    /// float
    Float,
    /// char
    Char,
    /// bool
    Bool,
    /// void
    Void,
    /// if
    If,
    /// else
    Else,
    /// while
    While,
    /// for
    For,
    /// return
    Return,

    // ============ Identifiers and Literals ============
    /// Identifier (variable name, function name, etc.)
    Ident(String),
    /// Integer constant
    IntCon(i64),
    /// Real constant
    RealCon(f64),
    /// Character constant
    CharCon(char),
    /// '\n'
    CharConNewline,
    /// '\0'
    CharConNull,
    /// String constant
    StringCon(String),
    /// true / false
    BoolCon(bool),

    // ============ Operators ============
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// =
    Assign,
    /// ==
    EqEq,
    /// !=
    Ne,
    /// <
    Lt,
    /// <=
    Le,
    /// >
    Gt,
    /// >=
    Ge,
    /// &&
    AndAnd,
    /// ||
    OrOr,
    /// !
    Not,
    /// & (by-reference parameter)
    Amp,

    // ============ Delimiters ============
    /// (
    LParen,
    /// )
    RParen,
    /// {
    LBrace,
    /// }
    RBrace,
    /// [
    LBracket,
    /// ]
    RBracket,
    /// ,
    Comma,
    /// ;
    Semicolon,

    // ============ Special ============
    /// End of file
    Eof,
    /// Malformed input; carries the reason
    Invalid(String),
}

impl TokenKind {
    /// Try to convert an identifier to a keyword
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "int" => Some(TokenKind::Int),
            "float" => Some(TokenKind::Float),
            "char" => Some(TokenKind::Char),
            "bool" => Some(TokenKind::Bool),
            "void" => Some(TokenKind::Void),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "while" => Some(TokenKind::While),
            "for" => Some(TokenKind::For),
            "return" => Some(TokenKind::Return),
            "true" => Some(TokenKind::BoolCon(true)),
            "false" => Some(TokenKind::BoolCon(false)),
            _ => None,
        }
    }

    /// Check if this token starts a declaration type (`void` excluded)
    pub fn is_type(&self) -> bool {
        matches!(self, TokenKind::Int | TokenKind::Float | TokenKind::Char | TokenKind::Bool)
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            TokenKind::EqEq | TokenKind::Ne | TokenKind::Lt | TokenKind::Le | TokenKind::Gt | TokenKind::Ge
        )
    }

    /// Short description used in "expected ..." diagnostics
    pub fn describe(&self) -> String {
        let text = match self {
            TokenKind::Int => "int",
            TokenKind::Float => "float",
            TokenKind::Char => "char",
            TokenKind::Bool => "bool",
            TokenKind::Void => "void",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::For => "for",
            TokenKind::Return => "return",
            TokenKind::Ident(_) => return "identifier".to_string(),
            TokenKind::IntCon(_) => return "integer constant".to_string(),
            TokenKind::RealCon(_) => return "real constant".to_string(),
            TokenKind::CharCon(_) | TokenKind::CharConNewline | TokenKind::CharConNull => {
                return "character constant".to_string()
            }
            TokenKind::StringCon(_) => return "string constant".to_string(),
            TokenKind::BoolCon(_) => return "boolean constant".to_string(),
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Assign => "=",
            TokenKind::EqEq => "==",
            TokenKind::Ne => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Not => "!",
            TokenKind::Amp => "&",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Eof => return "end of file".to_string(),
            TokenKind::Invalid(_) => return "invalid token".to_string(),
        };
        format!("'{}'", text)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
