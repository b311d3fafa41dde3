//! Lexer for C.SHORT
//!
//! Converts source code into a stream of tokens. Malformed input never
//! aborts the scan: it comes out as a `TokenKind::Invalid` token and the
//! parser rejects it when it gets there.
#![allow(dead_code)]

use log::trace;

use crate::frontend::token::{Token, TokenKind};
use crate::utils::Span;

/// Lexemes longer than this are truncated
pub const MAX_LEXEME_LEN: usize = 100;

/// The lexer state
pub struct Lexer {
    /// Source code as characters
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Start position of current token
    start: usize,
    line: usize,
    column: usize,
    /// Line and column of the current token's first character
    start_span: Span,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            start: 0,
            line: 1,
            column: 1,
            start_span: Span::new(1, 1),
        }
    }

    /// Get the current character without advancing
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// Get the next character without advancing
    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    /// Advance to the next character
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn consume_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Check if we've reached the end of input
    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Source text of the current token, truncated to the lexeme bound
    fn lexeme(&self) -> String {
        self.source[self.start..self.pos].iter().take(MAX_LEXEME_LEN).collect()
    }

    /// Create a token with the current lexeme and span
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.lexeme(), self.start_span)
    }

    fn invalid(&self, reason: &str) -> Token {
        self.make_token(TokenKind::Invalid(reason.to_string()))
    }

    /// Skip whitespace and comments
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                // Line comment
                '/' if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                // Block comment; unterminated ones run to end of input
                '/' if self.peek_next() == Some('*') => {
                    self.advance();
                    self.advance();
                    while !self.is_at_end() {
                        if self.peek() == Some('*') && self.peek_next() == Some('/') {
                            self.advance();
                            self.advance();
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = self.lexeme();
        let kind = TokenKind::keyword_from_str(&text).unwrap_or_else(|| TokenKind::Ident(text));
        self.make_token(kind)
    }

    /// Read a number literal; a decimal point makes it real
    fn read_number(&mut self) -> Token {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }

        let is_real = self.consume_if('.');
        if is_real {
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text: String = self.source[self.start..self.pos].iter().collect();
        if is_real {
            match text.parse::<f64>() {
                Ok(value) => self.make_token(TokenKind::RealCon(value)),
                Err(_) => self.invalid("malformed real constant"),
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => self.make_token(TokenKind::IntCon(value)),
                Err(_) => self.invalid("integer constant out of range"),
            }
        }
    }

    /// Read a string literal; it must close on the same line
    fn read_string(&mut self) -> Token {
        self.advance(); // consume opening quote

        let mut value = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    return self.make_token(TokenKind::StringCon(value));
                }
                None | Some('\n') => return self.invalid("unterminated string constant"),
                Some('\\') => {
                    value.push('\\');
                    self.advance();
                    if let Some(c) = self.peek().filter(|&c| c != '\n') {
                        value.push(c);
                        self.advance();
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Read a character literal
    fn read_char(&mut self) -> Token {
        self.advance(); // consume opening quote

        let kind = match self.peek() {
            None | Some('\n') => return self.invalid("unterminated character constant"),
            Some('\'') => {
                self.advance();
                return self.invalid("empty character constant");
            }
            Some('\\') => {
                self.advance();
                match self.peek() {
                    Some('n') => {
                        self.advance();
                        TokenKind::CharConNewline
                    }
                    Some('0') => {
                        self.advance();
                        TokenKind::CharConNull
                    }
                    None | Some('\n') => return self.invalid("unterminated character constant"),
                    Some(_) => {
                        self.advance();
                        return self.invalid("unknown escape sequence");
                    }
                }
            }
            Some(c) => {
                self.advance();
                TokenKind::CharCon(c)
            }
        };

        if self.consume_if('\'') {
            self.make_token(kind)
        } else {
            self.invalid("unterminated character constant")
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        self.start = self.pos;
        self.start_span = Span::new(self.line, self.column);

        let token = self.scan();
        trace!("token {:?} '{}' at {}", token.kind, token.lexeme, token.span);
        token
    }

    fn scan(&mut self) -> Token {
        let Some(c) = self.peek() else {
            return Token::eof(self.start_span);
        };

        if c.is_ascii_alphabetic() {
            return self.read_identifier();
        }
        if c.is_ascii_digit() {
            return self.read_number();
        }
        if c == '"' {
            return self.read_string();
        }
        if c == '\'' {
            return self.read_char();
        }

        self.advance();
        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '=' => {
                if self.consume_if('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.consume_if('=') {
                    TokenKind::Ne
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.consume_if('=') {
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.consume_if('=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.consume_if('&') {
                    TokenKind::AndAnd
                } else {
                    TokenKind::Amp
                }
            }
            '|' => {
                if self.consume_if('|') {
                    TokenKind::OrOr
                } else {
                    return self.invalid("unexpected character");
                }
            }
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            _ => return self.invalid("unexpected character"),
        };

        self.make_token(kind)
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_tokens() {
        let mut lexer = Lexer::new("int main(void) { }");
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0].kind, TokenKind::Int));
        assert!(matches!(tokens[1].kind, TokenKind::Ident(ref s) if s == "main"));
        assert!(matches!(tokens[2].kind, TokenKind::LParen));
        assert!(matches!(tokens[3].kind, TokenKind::Void));
        assert!(matches!(tokens[4].kind, TokenKind::RParen));
        assert!(matches!(tokens[5].kind, TokenKind::LBrace));
        assert!(matches!(tokens[6].kind, TokenKind::RBrace));
        assert!(matches!(tokens[7].kind, TokenKind::Eof));
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::new("42 3.14 7.").tokenize();

        assert!(matches!(tokens[0].kind, TokenKind::IntCon(42)));
        assert!(matches!(tokens[1].kind, TokenKind::RealCon(f) if (f - 3.14).abs() < 0.001));
        assert!(matches!(tokens[2].kind, TokenKind::RealCon(f) if (f - 7.0).abs() < 0.001));
        assert_eq!(tokens[1].lexeme, "3.14");
    }

    #[test]
    fn test_char_constants() {
        assert_eq!(
            kinds(r"'a' '\n' '\0'"),
            vec![
                TokenKind::CharCon('a'),
                TokenKind::CharConNewline,
                TokenKind::CharConNull,
                TokenKind::Eof
            ]
        );
        assert!(matches!(kinds(r"'\t'")[0], TokenKind::Invalid(_)));
        assert!(matches!(kinds("''")[0], TokenKind::Invalid(_)));
        assert!(matches!(kinds("'a")[0], TokenKind::Invalid(_)));
    }

    #[test]
    fn test_strings() {
        let tokens = Lexer::new("\"hello world\" \"open\n").tokenize();

        assert!(matches!(tokens[0].kind, TokenKind::StringCon(ref s) if s == "hello world"));
        assert!(matches!(tokens[1].kind, TokenKind::Invalid(ref r) if r.contains("unterminated")));
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("== != <= >= && || ! & = < >"),
            vec![
                TokenKind::EqEq,
                TokenKind::Ne,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Not,
                TokenKind::Amp,
                TokenKind::Assign,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Eof
            ]
        );
        assert!(matches!(kinds("|")[0], TokenKind::Invalid(_)));
        assert!(matches!(kinds("@")[0], TokenKind::Invalid(_)));
    }

    #[test]
    fn test_comments_and_positions() {
        let tokens = Lexer::new("// line\n/* block\n comment */ x\n  y").tokenize();

        assert!(matches!(tokens[0].kind, TokenKind::Ident(ref s) if s == "x"));
        assert_eq!(tokens[0].span, Span::new(3, 13));
        assert_eq!(tokens[1].span, Span::new(4, 3));
        assert!(tokens[2].is_eof());
    }

    #[test]
    fn test_long_lexeme_truncated() {
        let name = "a".repeat(MAX_LEXEME_LEN + 20);
        let tokens = Lexer::new(&name).tokenize();

        assert_eq!(tokens[0].lexeme.len(), MAX_LEXEME_LEN);
        assert!(matches!(tokens[0].kind, TokenKind::Ident(ref s) if s.len() == MAX_LEXEME_LEN));
    }

    #[test]
    fn test_booleans_are_constants() {
        assert_eq!(
            kinds("true false"),
            vec![TokenKind::BoolCon(true), TokenKind::BoolCon(false), TokenKind::Eof]
        );
    }
}
