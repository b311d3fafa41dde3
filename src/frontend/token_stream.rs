//! Pull-based token source with a single token of lookahead
//!
//! The grammar is LL(1) everywhere except at a statement-initial
//! identifier, where an assignment and a call statement only differ in
//! the token after the name. `TokenStream::peek` covers that case; the
//! buffer is an `Option`, so it can never hold more than one token.

use crate::frontend::lexer::Lexer;
use crate::frontend::token::Token;

pub struct TokenStream {
    lexer: Lexer,
    lookahead: Option<Token>,
}

impl TokenStream {
    pub fn new(lexer: Lexer) -> Self {
        Self { lexer, lookahead: None }
    }

    /// Next token, replaying a peeked one first
    pub fn next(&mut self) -> Token {
        match self.lookahead.take() {
            Some(token) => token,
            None => self.lexer.next_token(),
        }
    }

    /// Peek one token ahead and restore it: the following `next()`
    /// returns this exact token.
    pub fn peek(&mut self) -> &Token {
        let lexer = &mut self.lexer;
        self.lookahead.get_or_insert_with(|| lexer.next_token())
    }
}
