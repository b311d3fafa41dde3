//! Parser for C.SHORT
//!
//! Recursive descent with one token of lookahead. Semantic checks run
//! inline: the parser calls the `SemanticAnalyzer` at each point where a
//! construct becomes meaningful, and the first error ends the analysis.

use log::{debug, info};

use crate::frontend::lexer::Lexer;
use crate::frontend::semantic::{ParamDecl, SemanticAnalyzer};
use crate::frontend::symbols::{ParamSig, SymbolTable};
use crate::frontend::token::{Token, TokenKind};
use crate::frontend::token_stream::TokenStream;
use crate::types::{CType, PrimitiveType};
use crate::utils::{Error, Result, Span};

/// Parameters accepted in one function head
pub const MAX_PARAMS: usize = 32;

/// The parser
pub struct Parser {
    tokens: TokenStream,
    current: Token,
    sema: SemanticAnalyzer,
}

impl Parser {
    /// Create a new parser from a lexer
    pub fn new(lexer: Lexer) -> Self {
        Self::with_analyzer(lexer, SemanticAnalyzer::new())
    }

    pub fn with_analyzer(lexer: Lexer, sema: SemanticAnalyzer) -> Self {
        let mut tokens = TokenStream::new(lexer);
        let current = tokens.next();
        Self { tokens, current, sema }
    }

    pub fn analyzer(&self) -> &SemanticAnalyzer {
        &self.sema
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.sema.symbols
    }

    pub fn into_symbols(self) -> SymbolTable {
        self.sema.symbols
    }

    // ==================== Helper Methods ====================

    fn current_kind(&self) -> &TokenKind {
        &self.current.kind
    }

    fn advance(&mut self) -> Token {
        let next = self.tokens.next();
        std::mem::replace(&mut self.current, next)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn is_at_end(&self) -> bool {
        self.current.is_eof()
    }

    /// Error for the current token, which is not what `expected` names
    fn unexpected<T>(&self, expected: &str) -> Result<T> {
        let token = &self.current;
        match &token.kind {
            TokenKind::Invalid(reason) => Err(Error::InvalidToken {
                lexeme: token.lexeme.clone(),
                reason: reason.clone(),
                span: token.span,
            }),
            _ => Err(Error::UnexpectedToken {
                expected: expected.to_string(),
                found: token.lexeme.clone(),
                span: token.span,
            }),
        }
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            self.unexpected(&expected.describe())
        }
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span)> {
        match self.current_kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let token = self.advance();
                Ok((name, token.span))
            }
            _ => self.unexpected("identifier"),
        }
    }

    fn parse_type(&mut self) -> Result<PrimitiveType> {
        let ty = match self.current_kind() {
            TokenKind::Int => PrimitiveType::Int,
            TokenKind::Float => PrimitiveType::Float,
            TokenKind::Char => PrimitiveType::Char,
            TokenKind::Bool => PrimitiveType::Bool,
            _ => return self.unexpected("type ('int', 'float', 'char' or 'bool')"),
        };
        self.advance();
        Ok(ty)
    }

    // ==================== Declarations ====================

    /// Parse a complete program: `{ declaration }`
    pub fn parse_program(&mut self) -> Result<()> {
        while !self.is_at_end() {
            self.parse_declaration()?;
        }
        info!("end of input reached");
        Ok(())
    }

    fn parse_declaration(&mut self) -> Result<()> {
        if self.consume(&TokenKind::Void) {
            let (name, span) = self.expect_ident()?;
            if !self.check(&TokenKind::LParen) {
                return self.unexpected("'('");
            }
            return self.parse_function(CType::VOID, name, span);
        }

        if !self.current_kind().is_type() {
            return self.unexpected("declaration");
        }
        let base = self.parse_type()?;
        let (name, span) = self.expect_ident()?;

        if self.check(&TokenKind::LParen) {
            self.parse_function(base.into(), name, span)
        } else {
            self.parse_var_tail(base, name, span)?;
            self.expect(TokenKind::Semicolon)?;
            Ok(())
        }
    }

    /// `[ '[' INT ']' ] { ',' IDENT [ '[' INT ']' ] }` after the first name
    fn parse_var_tail(&mut self, base: PrimitiveType, name: String, span: Span) -> Result<()> {
        self.parse_var_item(base, &name, span)?;
        while self.consume(&TokenKind::Comma) {
            let (name, span) = self.expect_ident()?;
            self.parse_var_item(base, &name, span)?;
        }
        Ok(())
    }

    fn parse_var_item(&mut self, base: PrimitiveType, name: &str, span: Span) -> Result<()> {
        self.sema.check_redeclaration(name, span)?;

        let size = if self.consume(&TokenKind::LBracket) {
            let size = match *self.current_kind() {
                TokenKind::IntCon(n) => n as usize,
                _ => return self.unexpected("integer constant"),
            };
            self.advance();
            self.expect(TokenKind::RBracket)?;
            Some(size)
        } else {
            None
        };

        self.sema.declare_variable(name, base, size, span)?;
        info!(
            "declaration: {:?} variable '{}'{}",
            self.sema.scope(),
            name,
            size.map(|n| format!("[{}]", n)).unwrap_or_default()
        );
        Ok(())
    }

    /// Function head from '(' on, then ';' (prototype) or a body
    fn parse_function(&mut self, ret: CType, name: String, span: Span) -> Result<()> {
        let prototype = self.sema.begin_function_head(&name, span)?;

        self.expect(TokenKind::LParen)?;
        let params = self.parse_params(&name)?;
        self.expect(TokenKind::RParen)?;

        if let Some(id) = prototype {
            self.sema.check_signature(id, ret, &params, span)?;
        }

        match self.current_kind() {
            TokenKind::Semicolon => {
                self.advance();
                self.sema.declare_function(&name, ret, &params, prototype, false, span)?;
                info!("prototype: {} {}({} parameter(s))", ret, name, params.len());
                Ok(())
            }
            TokenKind::LBrace => {
                self.sema.declare_function(&name, ret, &params, prototype, true, span)?;
                info!("function definition: {} {}", ret, name);
                self.sema.enter_function(&name, ret, &params)?;
                let close = self.parse_block()?;
                self.sema.exit_function(close)
            }
            _ => self.unexpected("';' or '{'"),
        }
    }

    /// `'void' | param { ',' param }`
    fn parse_params(&mut self, function: &str) -> Result<Vec<ParamDecl>> {
        if self.consume(&TokenKind::Void) {
            return Ok(Vec::new());
        }

        let mut params = Vec::new();
        loop {
            let param = self.parse_param(&params)?;
            if params.len() >= MAX_PARAMS {
                return Err(Error::TooManyParameters {
                    name: function.to_string(),
                    max: MAX_PARAMS,
                    span: param.span,
                });
            }
            params.push(param);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    /// `type [ '&' ] IDENT [ '[' ']' ]`
    fn parse_param(&mut self, earlier: &[ParamDecl]) -> Result<ParamDecl> {
        let base = self.parse_type()?;
        let by_ref = self.consume(&TokenKind::Amp);
        let (name, span) = self.expect_ident()?;
        self.sema.check_parameter(earlier, &name, span)?;

        let ty = if self.consume(&TokenKind::LBracket) {
            self.expect(TokenKind::RBracket)?;
            CType::Array(base)
        } else {
            base.into()
        };

        Ok(ParamDecl { name, sig: ParamSig { ty, by_ref }, span })
    }

    /// `'{' { type var-tail ';' } { statement } '}'`; returns the span of
    /// the closing brace
    fn parse_block(&mut self) -> Result<Span> {
        self.expect(TokenKind::LBrace)?;

        while self.current_kind().is_type() {
            let base = self.parse_type()?;
            let (name, span) = self.expect_ident()?;
            self.parse_var_tail(base, name, span)?;
            self.expect(TokenKind::Semicolon)?;
        }

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            self.parse_stmt()?;
        }

        Ok(self.expect(TokenKind::RBrace)?.span)
    }

    // ==================== Statements ====================

    fn parse_stmt(&mut self) -> Result<()> {
        match self.current_kind() {
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::LBrace => self.parse_block().map(|_| ()),
            TokenKind::Semicolon => {
                self.advance();
                Ok(())
            }
            TokenKind::Ident(_) => self.parse_ident_stmt(),
            _ => self.unexpected("statement"),
        }
    }

    fn parse_if_stmt(&mut self) -> Result<()> {
        self.expect(TokenKind::If)?;
        info!("statement: if");
        self.expect(TokenKind::LParen)?;
        self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        self.parse_stmt()?;

        if self.consume(&TokenKind::Else) {
            self.parse_stmt()?;
        }
        Ok(())
    }

    fn parse_while_stmt(&mut self) -> Result<()> {
        self.expect(TokenKind::While)?;
        info!("statement: while");
        self.expect(TokenKind::LParen)?;
        self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        self.parse_stmt()
    }

    /// `'for' '(' [assign] ';' [expr] ';' [assign] ')' statement`
    fn parse_for_stmt(&mut self) -> Result<()> {
        self.expect(TokenKind::For)?;
        info!("statement: for");
        self.expect(TokenKind::LParen)?;

        if !self.check(&TokenKind::Semicolon) {
            self.parse_assign()?;
        }
        self.expect(TokenKind::Semicolon)?;

        if !self.check(&TokenKind::Semicolon) {
            self.parse_expr()?;
        }
        self.expect(TokenKind::Semicolon)?;

        if !self.check(&TokenKind::RParen) {
            self.parse_assign()?;
        }
        self.expect(TokenKind::RParen)?;

        self.parse_stmt()
    }

    fn parse_return_stmt(&mut self) -> Result<()> {
        let span = self.expect(TokenKind::Return)?.span;
        info!("statement: return");

        if self.check(&TokenKind::Semicolon) {
            self.sema.check_bare_return(span)?;
        } else {
            self.sema.check_return_value(span)?;
            self.parse_expr()?;
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    /// Statement starting with an identifier: the token after the name
    /// decides between assignment and call.
    fn parse_ident_stmt(&mut self) -> Result<()> {
        let ahead = self.tokens.peek().kind.clone();
        debug!("identifier statement, lookahead {}", ahead);

        match ahead {
            TokenKind::Assign | TokenKind::LBracket => {
                info!("statement: assignment");
                self.parse_assign()?;
            }
            TokenKind::LParen => {
                info!("statement: call");
                let (name, span) = self.expect_ident()?;
                self.parse_call(&name, true, span)?;
            }
            _ => {
                self.advance();
                return self.unexpected("'=', '[' or '('");
            }
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    /// `IDENT [ '[' expr ']' ] '=' expr`
    fn parse_assign(&mut self) -> Result<()> {
        let (name, span) = self.expect_ident()?;
        self.sema.begin_assignment(&name, span)?;

        if self.consume(&TokenKind::LBracket) {
            self.sema.index_assignment_target(span)?;
            self.parse_expr()?;
            self.expect(TokenKind::RBracket)?;
        }

        self.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        self.sema.finish_assignment(value, span)
    }

    /// `'(' [ expr { ',' expr } ] ')'` after a function name
    fn parse_call(&mut self, name: &str, as_statement: bool, span: Span) -> Result<CType> {
        let callee = self.sema.resolve_call(name, as_statement, span)?;

        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.consume(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        self.sema.check_arguments(&callee, &args, span)?;
        Ok(callee.ret)
    }

    // ==================== Expressions ====================

    /// `simple-expr [ rel-op simple-expr ]`
    fn parse_expr(&mut self) -> Result<CType> {
        let mut ty = self.parse_simple_expr()?;

        if self.current_kind().is_relational() {
            self.advance();
            let right = self.parse_simple_expr()?;
            ty = CType::relational(ty, right);
        }

        Ok(self.sema.record_expression(ty))
    }

    /// `[ '+' | '-' ] term { ( '+' | '-' | '||' ) term }`
    fn parse_simple_expr(&mut self) -> Result<CType> {
        let signed = matches!(self.current_kind(), TokenKind::Plus | TokenKind::Minus);
        if signed {
            self.advance();
        }

        let mut ty = self.parse_term()?;
        if signed {
            ty = CType::signed(ty);
        }

        loop {
            match self.current_kind() {
                TokenKind::Plus | TokenKind::Minus => {
                    self.advance();
                    let right = self.parse_term()?;
                    ty = CType::arithmetic(ty, right);
                }
                TokenKind::OrOr => {
                    self.advance();
                    let right = self.parse_term()?;
                    ty = CType::logical(ty, right);
                }
                _ => return Ok(ty),
            }
        }
    }

    /// `factor { ( '*' | '/' | '&&' ) factor }`
    fn parse_term(&mut self) -> Result<CType> {
        let mut ty = self.parse_factor()?;

        loop {
            match self.current_kind() {
                TokenKind::Star | TokenKind::Slash => {
                    self.advance();
                    let right = self.parse_factor()?;
                    ty = CType::arithmetic(ty, right);
                }
                TokenKind::AndAnd => {
                    self.advance();
                    let right = self.parse_factor()?;
                    ty = CType::logical(ty, right);
                }
                _ => return Ok(ty),
            }
        }
    }

    fn parse_factor(&mut self) -> Result<CType> {
        if let Some(ty) = SemanticAnalyzer::constant_type(self.current_kind()) {
            self.advance();
            return Ok(ty);
        }

        match self.current_kind() {
            TokenKind::Ident(_) => {
                let (name, span) = self.expect_ident()?;
                match self.current_kind() {
                    TokenKind::LBracket => {
                        let ty = self.sema.resolve_indexed(&name, span)?;
                        self.advance();
                        self.parse_expr()?;
                        self.expect(TokenKind::RBracket)?;
                        Ok(ty)
                    }
                    TokenKind::LParen => self.parse_call(&name, false, span),
                    _ => self.sema.resolve_variable(&name, span),
                }
            }
            TokenKind::LParen => {
                self.advance();
                let ty = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(ty)
            }
            TokenKind::Not => {
                self.advance();
                let ty = self.parse_factor()?;
                Ok(CType::negated(ty))
            }
            _ => self.unexpected("expression"),
        }
    }
}
