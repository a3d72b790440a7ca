//! Twine semantic checker: parse tree in, typed instructions out.
//!
//! The checker walks the parser's statement list in source order, emitting
//! a flat instruction stream annotated with interned types, a symbol table,
//! and diagnostics. Statements stream one line at a time; record
//! declarations, record literals, nested record initializers, and match
//! expressions keep their in-progress state on explicit context stacks
//! that close on dedent.
//!
//! # Architecture
//!
//! - [`ty`]: the interned type store (primitives, refinements, lists,
//!   records, functions)
//! - [`inst`]: the instruction store and float pool
//! - [`env`]: symbols and the lexical scope stack
//! - [`blocks`]: block and match contexts
//! - [`literal`]: arbitrary-precision literal evaluation and narrowing
//! - `expr` / `bind` / `funcs` / `matches`: the checker passes, split by
//!   statement family
//!
//! Everything a compilation touches is owned by per-compilation stores;
//! there is no global state. Phase ordering is strict: tokenize, parse,
//! then check — [`compile`] runs all three.

pub mod blocks;
pub mod env;
pub mod inst;
pub mod literal;
pub mod ty;

mod bind;
mod expr;
mod funcs;
mod matches;

pub use funcs::{Func, FuncStore};

use twine_common::diag::{DiagCode, Diagnostic, Diagnostics};
use twine_common::ids::{InstId, NodeId, StringId, TypeId};
use twine_common::intern::StringInterner;
use twine_common::token::{Token, TokenKind, TokenList};
use twine_lexer::IndentMode;
use twine_parser::node::{NodeStore, ParseNode};
use twine_parser::Parse;

use crate::blocks::{BlockContext, MatchContext};
use crate::env::{ScopeStack, SymbolStore};
use crate::inst::{FloatPool, InstStore};
use crate::ty::{TypeStore, TY_INVALID};

/// The checker's output stores.
pub struct CheckResult {
    pub types: TypeStore,
    pub insts: InstStore,
    pub floats: FloatPool,
    pub symbols: SymbolStore,
    pub funcs: FuncStore,
    /// Whether checking added no errors to the diagnostic sink.
    pub succeeded: bool,
}

/// Check a parsed program.
///
/// Tokens and nodes are read-only inputs; the interner grows (flattened
/// symbol names are interned during checking) and diagnostics accumulate
/// in emission order.
pub fn check(
    parse: &Parse,
    tokens: &TokenList,
    interner: &mut StringInterner,
    diags: &mut Diagnostics,
) -> CheckResult {
    let errors_before = diags.error_count();
    let mut checker = Checker {
        nodes: &parse.nodes,
        tokens,
        interner,
        diags,
        types: TypeStore::new(),
        insts: InstStore::new(),
        floats: FloatPool::new(),
        symbols: SymbolStore::new(),
        funcs: FuncStore::new(),
        scopes: ScopeStack::new(),
        blocks: Vec::new(),
        match_ctx: None,
    };
    checker.check_program(parse);
    let Checker {
        types,
        insts,
        floats,
        symbols,
        funcs,
        ..
    } = checker;
    CheckResult {
        types,
        insts,
        floats,
        symbols,
        funcs,
        succeeded: diags.error_count() == errors_before,
    }
}

/// A full compilation: source text through tokenize, parse, and check.
pub struct Compilation {
    pub interner: StringInterner,
    pub tokens: TokenList,
    pub parse: Parse,
    pub result: CheckResult,
    pub diags: Diagnostics,
}

impl Compilation {
    /// Whether the whole pipeline finished without errors.
    pub fn succeeded(&self) -> bool {
        !self.diags.has_errors()
    }
}

/// Run the whole pipeline on a source string.
pub fn compile(source: &str, mode: IndentMode) -> Compilation {
    let mut interner = StringInterner::new();
    let mut diags = Diagnostics::new();
    let lexed = twine_lexer::tokenize(source, mode, &mut interner, &mut diags);
    let parse = twine_parser::parse(&lexed.tokens, &interner, &mut diags);
    let result = check(&parse, &lexed.tokens, &mut interner, &mut diags);
    Compilation {
        interner,
        tokens: lexed.tokens,
        parse,
        result,
        diags,
    }
}

/// Result of checking one expression: the emitted instruction and its
/// type. Failed checks carry `None` and the `invalid` type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Checked {
    pub inst: Option<InstId>,
    pub ty: TypeId,
}

impl Checked {
    pub(crate) fn ok(inst: InstId, ty: TypeId) -> Self {
        Checked { inst: Some(inst), ty }
    }

    pub(crate) fn invalid() -> Self {
        Checked {
            inst: None,
            ty: TY_INVALID,
        }
    }

    pub(crate) fn is_invalid(&self) -> bool {
        self.ty == TY_INVALID
    }
}

/// The checker: borrows the phase inputs, owns the output stores and the
/// context stacks. Method impls are split across `expr`, `bind`, `funcs`,
/// and `matches`.
pub(crate) struct Checker<'a> {
    pub(crate) nodes: &'a NodeStore,
    pub(crate) tokens: &'a TokenList,
    pub(crate) interner: &'a mut StringInterner,
    pub(crate) diags: &'a mut Diagnostics,
    pub(crate) types: TypeStore,
    pub(crate) insts: InstStore,
    pub(crate) floats: FloatPool,
    pub(crate) symbols: SymbolStore,
    pub(crate) funcs: FuncStore,
    pub(crate) scopes: ScopeStack,
    pub(crate) blocks: Vec<BlockContext>,
    pub(crate) match_ctx: Option<MatchContext>,
}

impl Checker<'_> {
    pub(crate) fn node(&self, id: NodeId) -> &ParseNode {
        self.nodes.get(id)
    }

    pub(crate) fn token_of(&self, node: NodeId) -> &Token {
        self.tokens.get(self.nodes.get(node).token)
    }

    /// Direct children in source order.
    pub(crate) fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes.children_lr(node)
    }

    /// The interned name carried by a node's identifier token.
    ///
    /// # Panics
    ///
    /// Panics when the node's token is not an identifier; the parser is
    /// contractually required to anchor name-bearing nodes on one.
    pub(crate) fn ident_of(&self, node: NodeId) -> StringId {
        match self.token_of(node).kind {
            TokenKind::Ident(name) => name,
            other => panic!("node anchored on {other:?}, expected an identifier"),
        }
    }

    /// The literal text carried by a node's literal token.
    ///
    /// # Panics
    ///
    /// Panics when the node's token is not a literal.
    pub(crate) fn literal_text(&self, node: NodeId) -> &str {
        match self.token_of(node).kind {
            TokenKind::IntLiteral(text) | TokenKind::FloatLiteral(text) => self.interner.get(text),
            other => panic!("node anchored on {other:?}, expected a literal"),
        }
    }

    /// Start a diagnostic at a node's source location.
    pub(crate) fn diag(&self, code: DiagCode, node: NodeId) -> Diagnostic {
        let token_id = self.nodes.get(node).token;
        let token = self.tokens.get(token_id);
        Diagnostic::new(code, token.line, token.column)
            .with_token(token_id)
            .with_node(node)
    }

    /// Canonical printed name of a type.
    pub(crate) fn type_name(&self, ty: TypeId) -> String {
        self.types.name(ty, self.interner)
    }
}
