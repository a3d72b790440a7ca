//! Function declarations, one-shot lambda definitions, and calls.
//!
//! A forward declaration `name: (P1, P2) -> R` registers the function type
//! and a forward entry; the definition `name = (p: P1, q: P2): R -> body`
//! must match it. Definitions are handled in one shot: the signature is
//! resolved, a scope is pushed for the parameters, the body is checked
//! against the return type, and the `[start, end)` instruction range of the
//! body is captured on the function entry for the backend.

use rustc_hash::FxHashMap;

use twine_common::diag::DiagCode;
use twine_common::ids::{FuncId, InstId, NodeId, StringId, SymbolId, TypeId};

use crate::inst::InstKind;
use crate::ty::{TY_INVALID, TY_NONE};
use crate::{Checked, Checker};

/// One function entry.
#[derive(Debug)]
pub struct Func {
    pub name: StringId,
    pub node: NodeId,
    /// The interned function type.
    pub ty: TypeId,
    pub symbol: SymbolId,
    /// Whether a definition has been seen (not just a forward declaration).
    pub defined: bool,
    /// The body's `[start, end)` instruction range, captured at definition.
    pub body: Option<(InstId, InstId)>,
    /// Parameter symbols, in order, captured at definition.
    pub params: Vec<SymbolId>,
}

/// Append-only function store with name lookup.
#[derive(Debug, Default)]
pub struct FuncStore {
    funcs: Vec<Func>,
    by_name: FxHashMap<StringId, FuncId>,
}

impl FuncStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, indexing it by name.
    pub fn add(&mut self, func: Func) -> FuncId {
        let id = FuncId::new(self.funcs.len());
        self.by_name.insert(func.name, id);
        self.funcs.push(func);
        id
    }

    /// Look up an entry by id.
    ///
    /// # Panics
    ///
    /// Panics if the id was not produced by this store.
    pub fn get(&self, id: FuncId) -> &Func {
        &self.funcs[id.index()]
    }

    pub fn get_mut(&mut self, id: FuncId) -> &mut Func {
        &mut self.funcs[id.index()]
    }

    /// Resolve a function by name.
    pub fn lookup(&self, name: StringId) -> Option<FuncId> {
        self.by_name.get(&name).copied()
    }

    /// Number of function entries.
    pub fn count(&self) -> usize {
        self.funcs.len()
    }
}

impl Checker<'_> {
    /// Forward declaration `name: (P1, P2) -> R`.
    pub(crate) fn declare_func(&mut self, name: StringId, node: NodeId, ty: TypeId) {
        if self.funcs.lookup(name).is_some() {
            let text = self.interner.get(name).to_owned();
            let diag = self
                .diag(DiagCode::SignatureMismatch, node)
                .with_arg("detail", format!("function `{text}` is already declared"));
            self.diags.push(diag);
            return;
        }
        let symbol = self.symbols.add(name, node, ty);
        self.scopes.insert(name, symbol);
        let func = self.funcs.add(Func {
            name,
            node,
            ty,
            symbol,
            defined: false,
            body: None,
            params: Vec::new(),
        });
        self.insts.add(InstKind::FuncDecl { func }, node, ty);
    }

    /// One-shot lambda definition `name = (p: P1, …): R -> body`.
    pub(crate) fn check_func_def(&mut self, node: NodeId) {
        let kids = self.children(node);
        let name = self.ident_of(node);
        debug_assert!(kids.len() >= 2, "FuncDef carries return type and body");
        let body_node = kids[kids.len() - 1];
        let ret_node = kids[kids.len() - 2];
        let param_nodes = &kids[..kids.len() - 2];

        let mut params = Vec::with_capacity(param_nodes.len());
        let mut bad_signature = false;
        for &param in param_nodes {
            let param_name = self.ident_of(param);
            let param_ty = self.resolve_type(self.children(param)[0]);
            if param_ty == TY_INVALID {
                bad_signature = true;
            }
            params.push((param_name, param, param_ty));
        }
        let ret = self.resolve_type(ret_node);
        if bad_signature || ret == TY_INVALID {
            return;
        }
        let fty = self
            .types
            .register_func(params.iter().map(|p| p.2).collect(), ret);

        let func = match self.funcs.lookup(name) {
            Some(func) => {
                let existing = self.funcs.get(func);
                let text = self.interner.get(name).to_owned();
                if existing.defined {
                    let diag = self
                        .diag(DiagCode::SignatureMismatch, node)
                        .with_arg("detail", format!("function `{text}` is already defined"));
                    self.diags.push(diag);
                    return;
                }
                if existing.ty != fty {
                    let declared = self.type_name(existing.ty);
                    let diag = self.diag(DiagCode::SignatureMismatch, node).with_arg(
                        "detail",
                        format!("definition of `{text}` does not match its declaration {declared}"),
                    );
                    self.diags.push(diag);
                }
                func
            }
            None => {
                let symbol = self.symbols.add(name, node, fty);
                self.scopes.insert(name, symbol);
                self.funcs.add(Func {
                    name,
                    node,
                    ty: fty,
                    symbol,
                    defined: false,
                    body: None,
                    params: Vec::new(),
                })
            }
        };

        self.scopes.push();
        let mut param_symbols = Vec::with_capacity(params.len());
        for (param_name, param_node, param_ty) in params {
            let symbol = self.symbols.add(param_name, param_node, param_ty);
            self.scopes.insert(param_name, symbol);
            param_symbols.push(symbol);
        }
        let start = InstId::new(self.insts.count());
        let body = self.check_expr(body_node, ret);
        self.scopes.pop();

        if body.ty != ret && body.ty != TY_NONE && body.ty != TY_INVALID {
            let diag = self
                .diag(DiagCode::LiteralKindMismatch, body_node)
                .with_arg("expected", self.type_name(ret))
                .with_arg("found", self.type_name(body.ty));
            self.diags.push(diag);
        }
        let end = InstId::new(self.insts.count());

        let entry_ty = self.funcs.get(func).ty;
        let entry = self.funcs.get_mut(func);
        entry.defined = true;
        entry.params = param_symbols;
        if let Some(body_inst) = body.inst {
            self.funcs.get_mut(func).body = Some((start, end));
            self.insts
                .add(InstKind::FuncDef { func, body: body_inst }, node, entry_ty);
        }
    }

    /// Call `callee(arg1, …, argn)`.
    pub(crate) fn check_call(&mut self, node: NodeId, expected: Option<TypeId>) -> Checked {
        let kids = self.children(node);
        let callee_node = kids[0];
        let arg_nodes = &kids[1..];

        let callee = self.infer_expr(callee_node);
        if callee.is_invalid() {
            return Checked::invalid();
        }
        let Some((params, ret)) = self.types.func_info(callee.ty) else {
            let diag = self
                .diag(DiagCode::LiteralKindMismatch, node)
                .with_arg("expected", "a function")
                .with_arg("found", self.type_name(callee.ty));
            self.diags.push(diag);
            return Checked::invalid();
        };

        let mut args = Vec::with_capacity(arg_nodes.len());
        let mut bad = false;
        for &arg in arg_nodes {
            let result = self.infer_expr(arg);
            if result.is_invalid() {
                bad = true;
            }
            args.push((arg, result));
        }
        if bad {
            return Checked::invalid();
        }

        if args.len() != params.len() {
            let diag = self.diag(DiagCode::SignatureMismatch, node).with_arg(
                "detail",
                format!(
                    "call passes {} arguments, function takes {}",
                    args.len(),
                    params.len()
                ),
            );
            self.diags.push(diag);
            return Checked::invalid();
        }

        for ((arg_node, result), &param) in args.iter().zip(&params) {
            if result.ty != param {
                let diag = self
                    .diag(DiagCode::LiteralKindMismatch, *arg_node)
                    .with_arg("expected", self.type_name(param))
                    .with_arg("found", self.type_name(result.ty));
                self.diags.push(diag);
                bad = true;
            }
        }
        if bad {
            return Checked::invalid();
        }

        if let Some(exp) = expected {
            if exp != ret {
                let diag = self
                    .diag(DiagCode::TypeMismatch, node)
                    .with_arg("expected", self.type_name(exp))
                    .with_arg("found", self.type_name(ret));
                self.diags.push(diag);
                return Checked::invalid();
            }
        }

        let Some(callee_inst) = callee.inst else {
            return Checked::invalid();
        };
        let inst = self.insts.add(
            InstKind::Call {
                callee: callee_inst,
                argc: arg_nodes.len() as u32,
            },
            node,
            ret,
        );
        Checked::ok(inst, ret)
    }
}
