// pepper-vm - Compile-time symbol resolution for Pepper
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Symbol table: maps identifiers to their storage class at compile time.
//!
//! Scopes form a stack. Function scopes own local slot numbering and a
//! free-variable list; block scopes (used for `for` loop headers) provide
//! name visibility only and allocate their slots from the nearest enclosing
//! function scope, or from the global scope at top level.
//!
//! Resolving a name that lives in an enclosing function promotes it to a
//! free variable in *every* function scope between the definition and the
//! use, so each intervening closure captures it and the capture chain stays
//! one level deep at runtime.

use std::collections::HashMap;

/// Storage class of a resolved symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    /// Slot in the globals array.
    Global,
    /// Slot in the owning function's frame window.
    Local,
    /// Slot in the executing closure's free list.
    Free,
    /// Index into the host builtin registry.
    Builtin,
    /// The enclosing function's own name (self-reference).
    Function,
}

/// A resolved symbol: name, storage class, and slot index.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub scope: SymbolScope,
    pub index: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    /// The outermost scope; definitions are globals.
    Global,
    /// A function body; definitions are locals, captures are recorded here.
    Function,
    /// A lexical block; names are visible only inside it, storage belongs
    /// to the enclosing function (or global) scope.
    Block,
}

/// One scope on the stack.
#[derive(Debug)]
pub struct Scope {
    kind: ScopeKind,
    store: HashMap<String, Symbol>,
    /// Enclosing-scope symbols captured by this function, in definition
    /// order. The compiler emits a load for each when building the closure.
    free_symbols: Vec<Symbol>,
    /// Definitions whose storage this scope owns (blocks always report 0).
    num_definitions: u16,
}

impl Scope {
    fn new(kind: ScopeKind) -> Self {
        Scope {
            kind,
            store: HashMap::new(),
            free_symbols: Vec::new(),
            num_definitions: 0,
        }
    }

    /// The symbols this function scope captured from enclosing scopes.
    pub fn free_symbols(&self) -> &[Symbol] {
        &self.free_symbols
    }

    /// Number of storage slots defined in this scope.
    pub fn num_definitions(&self) -> u16 {
        self.num_definitions
    }
}

/// The symbol table: a stack of scopes.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// Create a table containing only the global scope.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::new(ScopeKind::Global)],
        }
    }

    /// Enter a function scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new(ScopeKind::Function));
    }

    /// Enter a block scope (`for` loop header).
    pub fn push_block_scope(&mut self) {
        self.scopes.push(Scope::new(ScopeKind::Block));
    }

    /// Leave the current scope, returning it so the caller can read its
    /// free symbols and definition count. Names defined only in the popped
    /// scope become unresolvable.
    pub fn pop_scope(&mut self) -> Scope {
        debug_assert!(self.scopes.len() > 1, "cannot pop the global scope");
        self.scopes.pop().expect("scope stack is never empty")
    }

    /// Define `name` in the current scope. Storage comes from the nearest
    /// enclosing function scope (global at top level); redefining a name in
    /// the same scope shadows the previous symbol under a fresh slot.
    pub fn define(&mut self, name: &str) -> Symbol {
        let owner = self.owner_index();
        let scope = if owner == 0 {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let index = self.scopes[owner].num_definitions;
        self.scopes[owner].num_definitions += 1;

        let symbol = Symbol {
            name: name.to_string(),
            scope,
            index,
        };
        let top = self.scopes.len() - 1;
        self.scopes[top]
            .store
            .insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Register a host builtin at the outermost scope.
    pub fn define_builtin(&mut self, index: u16, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Builtin,
            index,
        };
        self.scopes[0].store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Register the enclosing function's own name for self-reference.
    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Function,
            index: 0,
        };
        let top = self.scopes.len() - 1;
        self.scopes[top]
            .store
            .insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Drop every scope above the global one. Used to recover after an
    /// aborted compilation left scopes open.
    pub fn unwind_to_global(&mut self) {
        self.scopes.truncate(1);
    }

    /// Resolve `name`, promoting captures through intervening function
    /// scopes as needed. Repeated resolution of the same name in the same
    /// scope yields the same symbol.
    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        self.resolve_at(self.scopes.len() - 1, name)
    }

    /// Number of storage slots owned by the current function scope
    /// (or the global scope at top level).
    pub fn num_definitions(&self) -> u16 {
        self.scopes[self.owner_index()].num_definitions
    }

    fn resolve_at(&mut self, depth: usize, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.scopes[depth].store.get(name) {
            return Some(symbol.clone());
        }
        if depth == 0 {
            return None;
        }

        let outer = self.resolve_at(depth - 1, name)?;
        match outer.scope {
            // Globals and builtins are reachable from anywhere as-is.
            SymbolScope::Global | SymbolScope::Builtin => Some(outer),
            // Crossing a function boundary captures the symbol; block
            // scopes inside the same function see it unchanged.
            _ => {
                if self.scopes[depth].kind == ScopeKind::Function {
                    Some(self.define_free(depth, outer))
                } else {
                    Some(outer)
                }
            }
        }
    }

    /// Record that `original` (a symbol of an enclosing scope) is captured
    /// by the function scope at `depth`, and return the capture's symbol.
    fn define_free(&mut self, depth: usize, original: Symbol) -> Symbol {
        let scope = &mut self.scopes[depth];
        scope.free_symbols.push(original.clone());

        let symbol = Symbol {
            name: original.name,
            scope: SymbolScope::Free,
            index: (scope.free_symbols.len() - 1) as u16,
        };
        // Stored so subsequent resolutions reuse this capture slot.
        scope.store.insert(symbol.name.clone(), symbol.clone());
        symbol
    }

    /// Index of the scope that owns storage for new definitions: the
    /// innermost non-block scope.
    fn owner_index(&self) -> usize {
        self.scopes
            .iter()
            .rposition(|s| s.kind != ScopeKind::Block)
            .expect("the global scope is always present")
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
