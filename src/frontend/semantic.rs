//! Semantic Analysis for C.SHORT
//!
//! There is no separate pass: the parser calls into `SemanticAnalyzer`
//! while it recognizes constructs. The analyzer owns the symbol table, the
//! current scope tier and the transient checking state:
//! - the assignment target whose right-hand side is being parsed
//! - the type of the most recently parsed expression
//! - the function whose body is being parsed, and whether it returned a value

use log::{debug, info};

use crate::frontend::symbols::{InsertError, ParamSig, Scope, SymbolId, SymbolKind, SymbolTable};
use crate::frontend::token::TokenKind;
use crate::types::{CType, PrimitiveType};
use crate::utils::{Error, Result, SemanticErrorKind, Span};

/// A parameter as written in a function head
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub sig: ParamSig,
    pub span: Span,
}

/// Signature of a resolved call target
#[derive(Debug, Clone, PartialEq)]
pub struct Callee {
    pub name: String,
    pub ret: CType,
    pub params: Vec<ParamSig>,
}

/// State of the function body being parsed
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionContext {
    pub name: String,
    pub ret: CType,
    pub returned_value: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct AssignTarget {
    name: String,
    ty: CType,
}

/// Semantic analyzer
pub struct SemanticAnalyzer {
    pub symbols: SymbolTable,
    scope: Scope,
    assign_target: Option<AssignTarget>,
    expr_type: Option<CType>,
    function: Option<FunctionContext>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self::with_symbols(SymbolTable::new())
    }

    pub fn with_symbols(symbols: SymbolTable) -> Self {
        Self {
            symbols,
            scope: Scope::Global,
            assign_target: None,
            expr_type: None,
            function: None,
        }
    }

    /// Build the error for a failed check. Every semantic violation goes
    /// through here and ends the analysis.
    pub fn fail<T>(&self, kind: SemanticErrorKind, name: &str, span: Span) -> Result<T> {
        Err(Error::Semantic { kind, name: name.to_string(), span })
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn current_function(&self) -> Option<&FunctionContext> {
        self.function.as_ref()
    }

    /// Type of the most recently parsed expression
    pub fn expression_type(&self) -> Option<CType> {
        self.expr_type
    }

    /// Type a constant token carries from its lexical class
    pub fn constant_type(kind: &TokenKind) -> Option<CType> {
        match kind {
            TokenKind::IntCon(_) => Some(CType::INT),
            TokenKind::RealCon(_) => Some(CType::FLOAT),
            TokenKind::CharCon(_) | TokenKind::CharConNewline | TokenKind::CharConNull => {
                Some(CType::CHAR)
            }
            TokenKind::BoolCon(_) => Some(CType::BOOL),
            TokenKind::StringCon(_) => Some(CType::STRING),
            _ => None,
        }
    }

    /// Remember the type of a finished expression
    pub fn record_expression(&mut self, ty: CType) -> CType {
        if ty == CType::Error {
            debug!("expression type poisoned");
        }
        self.expr_type = Some(ty);
        ty
    }

    fn insert(
        &mut self,
        name: &str,
        ty: CType,
        kind: SymbolKind,
        size: usize,
        span: Span,
    ) -> Result<SymbolId> {
        match self.symbols.insert(name, ty, kind, self.scope, size) {
            Ok(id) => Ok(id),
            Err(InsertError::Duplicate) => self.fail(SemanticErrorKind::Redeclaration, name, span),
            Err(InsertError::Full) => self.fail(SemanticErrorKind::SymbolTableFull, name, span),
        }
    }

    // ==================== Declarations ====================

    /// A new variable, array or parameter must not clash with an alive
    /// symbol of the current tier.
    pub fn check_redeclaration(&self, name: &str, span: Span) -> Result<()> {
        if self.symbols.alive_in_tier(name, self.scope).is_some() {
            return self.fail(SemanticErrorKind::Redeclaration, name, span);
        }
        Ok(())
    }

    /// Declare a variable (`size: Some(n)` for an array) in the current tier
    pub fn declare_variable(
        &mut self,
        name: &str,
        base: PrimitiveType,
        size: Option<usize>,
        span: Span,
    ) -> Result<SymbolId> {
        let (ty, kind, size) = match size {
            Some(n) => (CType::Array(base), SymbolKind::Array, n),
            None => (CType::Primitive(base), SymbolKind::Var, 1),
        };
        self.insert(name, ty, kind, size, span)
    }

    /// Look at a function name before its parameters are read. Returns the
    /// pending prototype this head may fulfil.
    pub fn begin_function_head(&self, name: &str, span: Span) -> Result<Option<SymbolId>> {
        let Some(id) = self.symbols.lookup_exact_id(name, Scope::Global) else {
            return Ok(None);
        };
        let existing = self.symbols.get(id);
        match (existing.is_function(), existing.defined) {
            (true, false) => Ok(Some(id)),
            (true, true) => self.fail(SemanticErrorKind::FunctionRedefined, name, span),
            (false, _) => self.fail(SemanticErrorKind::Redeclaration, name, span),
        }
    }

    /// Reject a parameter whose name already appears earlier in the head
    pub fn check_parameter(&self, params: &[ParamDecl], name: &str, span: Span) -> Result<()> {
        if params.iter().any(|p| p.name == name) {
            return self.fail(SemanticErrorKind::DuplicateParameter, name, span);
        }
        Ok(())
    }

    /// A head matching a pending prototype must agree on return type,
    /// parameter count and every parameter, position by position.
    pub fn check_signature(
        &self,
        prototype: SymbolId,
        ret: CType,
        params: &[ParamDecl],
        span: Span,
    ) -> Result<()> {
        let proto = self.symbols.get(prototype);
        if proto.ty != ret {
            return self.fail(
                SemanticErrorKind::ReturnTypeMismatch { expected: proto.ty, found: ret },
                &proto.name,
                span,
            );
        }
        if proto.param_count() != params.len() {
            return self.fail(
                SemanticErrorKind::ParameterCountMismatch {
                    expected: proto.param_count(),
                    found: params.len(),
                },
                &proto.name,
                span,
            );
        }
        for (i, (expected, found)) in proto.params.iter().zip(params).enumerate() {
            if *expected != found.sig {
                return self.fail(
                    SemanticErrorKind::ParameterTypeMismatch {
                        position: i + 1,
                        expected: expected.to_string(),
                        found: found.sig.to_string(),
                    },
                    &proto.name,
                    span,
                );
            }
        }
        Ok(())
    }

    /// Record a function head. A prototype is stored undefined; a
    /// definition is stored (or its prototype promoted) as defined.
    pub fn declare_function(
        &mut self,
        name: &str,
        ret: CType,
        params: &[ParamDecl],
        prototype: Option<SymbolId>,
        is_definition: bool,
        span: Span,
    ) -> Result<SymbolId> {
        let id = match prototype {
            Some(id) => id,
            None => {
                let id = self.insert(name, ret, SymbolKind::Function, 0, span)?;
                self.symbols.get_mut(id).params = params.iter().map(|p| p.sig).collect();
                id
            }
        };
        if is_definition {
            let symbol = self.symbols.get_mut(id);
            if symbol.defined {
                return self.fail(SemanticErrorKind::FunctionRedefined, name, span);
            }
            symbol.defined = true;
        }
        Ok(id)
    }

    /// Enter a function body: retire stale locals, switch to the local tier
    /// and register the parameters there.
    pub fn enter_function(&mut self, name: &str, ret: CType, params: &[ParamDecl]) -> Result<()> {
        self.symbols.clear_local_scope();
        self.scope = Scope::Local;
        self.function = Some(FunctionContext {
            name: name.to_string(),
            ret,
            returned_value: false,
        });
        info!("entering function '{}'", name);

        for param in params {
            let size = if param.sig.by_ref || param.sig.ty.is_array() { 0 } else { 1 };
            let id = self.insert(&param.name, param.sig.ty, SymbolKind::Param, size, param.span)?;
            self.symbols.get_mut(id).by_ref = param.sig.by_ref;
        }
        Ok(())
    }

    /// Closing brace of a function body
    pub fn exit_function(&mut self, span: Span) -> Result<()> {
        if let Some(ctx) = &self.function {
            if !ctx.ret.is_void() && !ctx.returned_value {
                return self.fail(SemanticErrorKind::MissingReturn, &ctx.name, span);
            }
            info!("leaving function '{}'", ctx.name);
        }
        self.symbols.clear_local_scope();
        self.scope = Scope::Global;
        self.function = None;
        Ok(())
    }

    // ==================== Returns ====================

    /// `return expr;` seen; called before the expression is parsed
    pub fn check_return_value(&mut self, span: Span) -> Result<()> {
        let Some(ctx) = self.function.as_mut() else {
            return Ok(());
        };
        if ctx.ret.is_void() {
            let name = ctx.name.clone();
            return self.fail(SemanticErrorKind::VoidReturnsValue, &name, span);
        }
        ctx.returned_value = true;
        Ok(())
    }

    /// `return;` seen
    pub fn check_bare_return(&self, span: Span) -> Result<()> {
        match &self.function {
            Some(ctx) if !ctx.ret.is_void() => {
                self.fail(SemanticErrorKind::MissingReturnValue, &ctx.name, span)
            }
            _ => Ok(()),
        }
    }

    // ==================== Identifier uses ====================

    /// Plain identifier inside an expression
    pub fn resolve_variable(&self, name: &str, span: Span) -> Result<CType> {
        match self.symbols.lookup_enclosing(name) {
            None => self.fail(SemanticErrorKind::NotDeclared, name, span),
            Some(s) if s.is_function() => self.fail(SemanticErrorKind::FunctionAsVariable, name, span),
            Some(s) => Ok(s.ty),
        }
    }

    /// `name[...]` inside an expression; yields the element type
    pub fn resolve_indexed(&self, name: &str, span: Span) -> Result<CType> {
        let ty = self.resolve_variable(name, span)?;
        if !ty.is_array() {
            return self.fail(SemanticErrorKind::NotAnArray, name, span);
        }
        Ok(ty.element())
    }

    /// `name(...)`, either as a statement or inside an expression
    pub fn resolve_call(&self, name: &str, as_statement: bool, span: Span) -> Result<Callee> {
        let Some(symbol) = self.symbols.lookup_enclosing(name) else {
            return self.fail(SemanticErrorKind::NotDeclared, name, span);
        };
        if !symbol.is_function() {
            return self.fail(SemanticErrorKind::NotAFunction, name, span);
        }
        match (as_statement, symbol.ty.is_void()) {
            (true, false) => self.fail(SemanticErrorKind::UnusedResult, name, span),
            (false, true) => self.fail(SemanticErrorKind::VoidInExpression, name, span),
            _ => Ok(Callee {
                name: symbol.name.clone(),
                ret: symbol.ty,
                params: symbol.params.clone(),
            }),
        }
    }

    /// Arguments must match the parameter list in number and type
    pub fn check_arguments(&self, callee: &Callee, args: &[CType], span: Span) -> Result<()> {
        if callee.params.len() != args.len() {
            return self.fail(
                SemanticErrorKind::ArgumentCountMismatch {
                    expected: callee.params.len(),
                    found: args.len(),
                },
                &callee.name,
                span,
            );
        }
        for (i, (param, arg)) in callee.params.iter().zip(args).enumerate() {
            if !param.ty.accepts(arg) {
                return self.fail(
                    SemanticErrorKind::ArgumentTypeMismatch {
                        position: i + 1,
                        expected: param.ty,
                        found: *arg,
                    },
                    &callee.name,
                    span,
                );
            }
        }
        Ok(())
    }

    // ==================== Assignments ====================

    /// Left-hand identifier of an assignment
    pub fn begin_assignment(&mut self, name: &str, span: Span) -> Result<()> {
        let ty = self.resolve_variable(name, span)?;
        self.assign_target = Some(AssignTarget { name: name.to_string(), ty });
        self.expr_type = None;
        Ok(())
    }

    /// The target is indexed: it must be an array and its element type is assigned
    pub fn index_assignment_target(&mut self, span: Span) -> Result<()> {
        let Some(target) = self.assign_target.as_mut() else {
            return Ok(());
        };
        if !target.ty.is_array() {
            let name = target.name.clone();
            return self.fail(SemanticErrorKind::NotAnArray, &name, span);
        }
        target.ty = target.ty.element();
        Ok(())
    }

    /// Right-hand side fully parsed: it must be compatible with the target
    pub fn finish_assignment(&mut self, value: CType, span: Span) -> Result<()> {
        let Some(target) = self.assign_target.take() else {
            return Ok(());
        };
        if !target.ty.accepts(&value) {
            return self.fail(
                SemanticErrorKind::IncompatibleAssignment { expected: target.ty, found: value },
                &target.name,
                span,
            );
        }
        Ok(())
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, ty: CType, by_ref: bool) -> ParamDecl {
        ParamDecl { name: name.to_string(), sig: ParamSig { ty, by_ref }, span: Span::dummy() }
    }

    #[test]
    fn test_redeclaration_in_same_tier() {
        let mut sema = SemanticAnalyzer::new();
        sema.declare_variable("x", PrimitiveType::Int, None, Span::dummy()).unwrap();

        let err = sema.check_redeclaration("x", Span::dummy()).unwrap_err();
        assert_eq!(err.semantic_kind(), Some(&SemanticErrorKind::Redeclaration));
    }

    #[test]
    fn test_prototype_is_not_a_collision() {
        let mut sema = SemanticAnalyzer::new();
        let id = sema.declare_function("f", CType::INT, &[], None, false, Span::dummy()).unwrap();

        assert_eq!(sema.begin_function_head("f", Span::dummy()).unwrap(), Some(id));
        sema.declare_function("f", CType::INT, &[], Some(id), true, Span::dummy()).unwrap();
        assert!(sema.symbols.get(id).defined);

        let err = sema.begin_function_head("f", Span::dummy()).unwrap_err();
        assert_eq!(err.semantic_kind(), Some(&SemanticErrorKind::FunctionRedefined));
    }

    #[test]
    fn test_signature_mismatch() {
        let mut sema = SemanticAnalyzer::new();
        let params = [param("a", CType::INT, false)];
        let id = sema.declare_function("f", CType::INT, &params, None, false, Span::dummy()).unwrap();

        assert!(sema.check_signature(id, CType::INT, &params, Span::dummy()).is_ok());
        assert!(matches!(
            sema.check_signature(id, CType::CHAR, &params, Span::dummy()),
            Err(Error::Semantic { kind: SemanticErrorKind::ReturnTypeMismatch { .. }, .. })
        ));
        assert!(matches!(
            sema.check_signature(id, CType::INT, &[], Span::dummy()),
            Err(Error::Semantic { kind: SemanticErrorKind::ParameterCountMismatch { expected: 1, found: 0 }, .. })
        ));
        assert!(matches!(
            sema.check_signature(id, CType::INT, &[param("a", CType::INT, true)], Span::dummy()),
            Err(Error::Semantic { kind: SemanticErrorKind::ParameterTypeMismatch { position: 1, .. }, .. })
        ));
    }

    #[test]
    fn test_function_scope_lifecycle() {
        let mut sema = SemanticAnalyzer::new();
        sema.enter_function("f", CType::VOID, &[param("a", CType::INT, true)]).unwrap();
        assert_eq!(sema.scope(), Scope::Local);
        sema.declare_variable("t", PrimitiveType::Char, Some(3), Span::dummy()).unwrap();
        assert_eq!(sema.resolve_indexed("t", Span::dummy()).unwrap(), CType::CHAR);
        assert_eq!(sema.symbols.lookup_enclosing("a").unwrap().size, 0);

        sema.exit_function(Span::dummy()).unwrap();
        assert_eq!(sema.scope(), Scope::Global);
        assert!(sema.symbols.lookup_enclosing("a").is_none());
        assert!(sema.symbols.lookup_enclosing("t").is_none());
    }

    #[test]
    fn test_missing_return() {
        let mut sema = SemanticAnalyzer::new();
        sema.enter_function("f", CType::INT, &[]).unwrap();
        let err = sema.exit_function(Span::dummy()).unwrap_err();
        assert_eq!(err.semantic_kind(), Some(&SemanticErrorKind::MissingReturn));

        let mut sema = SemanticAnalyzer::new();
        sema.enter_function("g", CType::INT, &[]).unwrap();
        sema.check_return_value(Span::dummy()).unwrap();
        assert!(sema.exit_function(Span::dummy()).is_ok());
    }

    #[test]
    fn test_return_discipline() {
        let mut sema = SemanticAnalyzer::new();
        sema.enter_function("v", CType::VOID, &[]).unwrap();
        assert!(sema.check_bare_return(Span::dummy()).is_ok());
        let err = sema.check_return_value(Span::dummy()).unwrap_err();
        assert_eq!(err.semantic_kind(), Some(&SemanticErrorKind::VoidReturnsValue));
    }

    #[test]
    fn test_call_usage_rules() {
        let mut sema = SemanticAnalyzer::new();
        sema.declare_function("v", CType::VOID, &[], None, false, Span::dummy()).unwrap();
        sema.declare_function("n", CType::INT, &[], None, false, Span::dummy()).unwrap();
        sema.declare_variable("x", PrimitiveType::Int, None, Span::dummy()).unwrap();

        assert!(sema.resolve_call("v", true, Span::dummy()).is_ok());
        assert!(sema.resolve_call("n", false, Span::dummy()).is_ok());
        let kind_of = |r: Result<Callee>| r.unwrap_err().semantic_kind().cloned();
        assert_eq!(kind_of(sema.resolve_call("v", false, Span::dummy())), Some(SemanticErrorKind::VoidInExpression));
        assert_eq!(kind_of(sema.resolve_call("n", true, Span::dummy())), Some(SemanticErrorKind::UnusedResult));
        assert_eq!(kind_of(sema.resolve_call("x", true, Span::dummy())), Some(SemanticErrorKind::NotAFunction));
        assert_eq!(kind_of(sema.resolve_call("nope", true, Span::dummy())), Some(SemanticErrorKind::NotDeclared));
    }

    #[test]
    fn test_assignment_compatibility() {
        let mut sema = SemanticAnalyzer::new();
        sema.declare_variable("b", PrimitiveType::Bool, None, Span::dummy()).unwrap();
        sema.declare_variable("f", PrimitiveType::Float, None, Span::dummy()).unwrap();

        sema.begin_assignment("b", Span::dummy()).unwrap();
        assert!(sema.finish_assignment(CType::INT, Span::dummy()).is_ok());

        sema.begin_assignment("f", Span::dummy()).unwrap();
        let err = sema.finish_assignment(CType::INT, Span::dummy()).unwrap_err();
        assert_eq!(
            err.semantic_kind(),
            Some(&SemanticErrorKind::IncompatibleAssignment { expected: CType::FLOAT, found: CType::INT })
        );
    }

    #[test]
    fn test_constant_types() {
        assert_eq!(SemanticAnalyzer::constant_type(&TokenKind::IntCon(1)), Some(CType::INT));
        assert_eq!(SemanticAnalyzer::constant_type(&TokenKind::CharConNull), Some(CType::CHAR));
        assert_eq!(
            SemanticAnalyzer::constant_type(&TokenKind::StringCon("s".into())),
            Some(CType::STRING)
        );
        assert_eq!(SemanticAnalyzer::constant_type(&TokenKind::Plus), None);
    }
}
