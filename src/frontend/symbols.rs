//! Symbol table for C.SHORT
//!
//! A flat, append-only registry. There are exactly two scope tiers and no
//! scope frames: leaving a function body turns its local entries into
//! zombies, which stay in the table for the final dump but are skipped by
//! every lookup. Lookups scan newest-first, so a live local shadows a
//! global of the same name.
#![allow(dead_code)]

use std::fmt;

use log::debug;
use serde::Serialize;

use crate::types::CType;

/// Symbol table capacity
pub const MAX_SYMBOLS: usize = 1000;

/// Unique identifier for a symbol (its index in the table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(usize);

/// Scope tier of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Local,
}

/// Kind of symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Var,
    Array,
    Function,
    Param,
}

/// Whether lookups can still see a symbol. Alive -> Zombie is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    Alive,
    Zombie,
}

/// One parameter of a function signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamSig {
    pub ty: CType,
    pub by_ref: bool,
}

impl fmt::Display for ParamSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.by_ref {
            write!(f, "{}&", self.ty)
        } else {
            write!(f, "{}", self.ty)
        }
    }
}

/// Symbol information
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symbol {
    pub name: String,
    /// Declared type; return type for functions, `T[]` for arrays
    pub ty: CType,
    pub kind: SymbolKind,
    pub scope: Scope,
    pub state: Liveness,
    /// Array length, 1 for scalars, 0 for functions and by-reference/array parameters
    pub size: usize,
    /// Parameters only
    pub by_ref: bool,
    /// Functions only: a body has been seen
    pub defined: bool,
    /// Functions only: ordered parameter signature
    pub params: Vec<ParamSig>,
}

impl Symbol {
    pub fn is_alive(&self) -> bool {
        self.state == Liveness::Alive
    }

    pub fn is_function(&self) -> bool {
        self.kind == SymbolKind::Function
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

/// Why an insertion was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    /// An alive symbol with that name already exists in the same tier
    Duplicate,
    /// Capacity exhausted
    Full,
}

/// Flat symbol table with zombie liveness
#[derive(Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    capacity: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::with_capacity(MAX_SYMBOLS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { symbols: Vec::new(), capacity }
    }

    /// Append a new alive symbol
    pub fn insert(
        &mut self,
        name: &str,
        ty: CType,
        kind: SymbolKind,
        scope: Scope,
        size: usize,
    ) -> std::result::Result<SymbolId, InsertError> {
        if self.alive_in_tier(name, scope).is_some() {
            return Err(InsertError::Duplicate);
        }
        if self.symbols.len() >= self.capacity {
            return Err(InsertError::Full);
        }

        debug!("insert {} '{}' : {} ({:?}, size {})", kind_name(kind), name, ty, scope, size);
        let id = SymbolId(self.symbols.len());
        self.symbols.push(Symbol {
            name: name.to_string(),
            ty,
            kind,
            scope,
            state: Liveness::Alive,
            size,
            by_ref: false,
            defined: false,
            params: Vec::new(),
        });
        Ok(id)
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }

    /// Alive symbol with this name declared in exactly this tier
    pub fn alive_in_tier(&self, name: &str, scope: Scope) -> Option<&Symbol> {
        self.symbols
            .iter()
            .rev()
            .find(|s| s.is_alive() && s.scope == scope && s.name == name)
    }

    fn position_exact(&self, name: &str, scope: Scope) -> Option<usize> {
        self.symbols.iter().rposition(|s| {
            s.is_alive()
                && s.name == name
                && match scope {
                    // From a local context the innermost alive symbol wins
                    Scope::Local => true,
                    Scope::Global => s.scope == Scope::Global,
                }
        })
    }

    /// Lookup as seen from `scope`: a local query accepts the nearest alive
    /// symbol of either tier, a global query only an alive global one.
    pub fn lookup_exact(&self, name: &str, scope: Scope) -> Option<&Symbol> {
        self.position_exact(name, scope).map(|i| &self.symbols[i])
    }

    pub fn lookup_exact_id(&self, name: &str, scope: Scope) -> Option<SymbolId> {
        self.position_exact(name, scope).map(SymbolId)
    }

    /// Nearest alive symbol by name, irrespective of tier
    pub fn lookup_enclosing(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().rev().find(|s| s.is_alive() && s.name == name)
    }

    /// Zombify every alive local symbol; returns how many were retired.
    /// The whole table is scanned, locals need not be contiguous.
    pub fn clear_local_scope(&mut self) -> usize {
        let mut retired = 0;
        for symbol in self
            .symbols
            .iter_mut()
            .filter(|s| s.scope == Scope::Local && s.is_alive())
        {
            symbol.state = Liveness::Zombie;
            retired += 1;
        }
        if retired > 0 {
            debug!("local scope cleared: {} symbol(s) zombified", retired);
        }
        retired
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Human-readable dump of every entry, zombies included
    pub fn dump(&self) -> String {
        self.to_string()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

fn kind_name(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::Var => "var",
        SymbolKind::Array => "array",
        SymbolKind::Function => "function",
        SymbolKind::Param => "param",
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "======= SYMBOL TABLE =======")?;
        for s in &self.symbols {
            let scope = match s.scope {
                Scope::Global => "global",
                Scope::Local => "local",
            };
            let state = match s.state {
                Liveness::Alive => "ALIVE",
                Liveness::Zombie => "ZOMBIE",
            };
            write!(
                f,
                "Name: {:<10} | Type: {:<7} | Kind: {:<8} | Scope: {:<6} | Size: {} | State: {}",
                s.name,
                s.ty.to_string(),
                kind_name(s.kind),
                scope,
                s.size,
                state
            )?;
            if s.is_function() {
                let params: Vec<String> = s.params.iter().map(ToString::to_string).collect();
                write!(
                    f,
                    " | Params: ({}) | Defined: {}",
                    params.join(", "),
                    if s.defined { "yes" } else { "no" }
                )?;
            } else if s.by_ref {
                write!(f, " | By reference")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "============================")
    }
}
