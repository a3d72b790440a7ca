//! Symbols and the lexical scope stack.
//!
//! Symbols live in a flat store; visibility is governed by the scope stack.
//! Entering a function body or match arm pushes a scope, leaving pops it,
//! and lookups search innermost-outward. Each scope also carries the
//! list-binding registry for the flattened list bindings introduced in it,
//! which enables compile-time index-bound checks on `xs[i]`.

use rustc_hash::FxHashMap;

use twine_common::ids::{NodeId, StringId, SymbolId, TypeId};

/// A named, typed binding anchored at its parse node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Symbol {
    pub name: StringId,
    pub node: NodeId,
    pub ty: TypeId,
}

/// Append-only symbol store.
#[derive(Debug, Default)]
pub struct SymbolStore {
    symbols: Vec<Symbol>,
}

impl SymbolStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a symbol, returning its id.
    pub fn add(&mut self, name: StringId, node: NodeId, ty: TypeId) -> SymbolId {
        let id = SymbolId::new(self.symbols.len());
        self.symbols.push(Symbol { name, node, ty });
        id
    }

    /// Look up a symbol by id.
    ///
    /// # Panics
    ///
    /// Panics if the id was not produced by this store.
    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    /// Number of symbols created.
    pub fn count(&self) -> usize {
        self.symbols.len()
    }
}

#[derive(Debug, Default)]
struct Scope {
    names: FxHashMap<StringId, SymbolId>,
    list_bindings: FxHashMap<StringId, TypeId>,
}

/// Stack of lexical scopes. The global scope is always present.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    /// Create a stack with one empty global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// Push a new empty scope.
    pub fn push(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pop the innermost scope.
    ///
    /// # Panics
    ///
    /// Panics if called when only the global scope remains.
    pub fn pop(&mut self) {
        assert!(self.scopes.len() > 1, "cannot pop the global scope");
        self.scopes.pop();
    }

    /// Bind a name in the innermost scope, shadowing outer bindings.
    pub fn insert(&mut self, name: StringId, symbol: SymbolId) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .names
            .insert(name, symbol);
    }

    /// Resolve a name, searching innermost-outward.
    pub fn lookup(&self, name: StringId) -> Option<SymbolId> {
        for scope in self.scopes.iter().rev() {
            if let Some(&symbol) = scope.names.get(&name) {
                return Some(symbol);
            }
        }
        None
    }

    /// Record that `name` is a flattened list binding of the given list
    /// type, in the innermost scope.
    pub fn register_list_binding(&mut self, name: StringId, ty: TypeId) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .list_bindings
            .insert(name, ty);
    }

    /// Resolve a flattened list binding by base name.
    pub fn list_binding(&self, name: StringId) -> Option<TypeId> {
        for scope in self.scopes.iter().rev() {
            if let Some(&ty) = scope.list_bindings.get(&name) {
                return Some(ty);
            }
        }
        None
    }

    /// Number of scopes on the stack.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
