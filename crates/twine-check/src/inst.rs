//! The semantic-IR instruction store and the float constant pool.
//!
//! Instructions are laid out in emission order; ids increase monotonically,
//! so a function body is the half-open id range captured at definition
//! time. Every instruction carries the parse node it came from and its
//! checked type; an instruction typed `invalid` must never reach code
//! generation.

use serde::Serialize;

use twine_common::ids::{FloatId, FuncId, InstId, NodeId, SymbolId, TypeId};
use twine_common::token::TokenKind;

/// A binary operator, as carried by `BinaryOp` instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    /// `%` — remainder.
    Rem,
    /// `%%` — floor modulo.
    FloorMod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    /// `>>>` — logical (unsigned) right shift.
    ShrUnsigned,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Eq,
    NotEq,
}

impl BinOp {
    /// Map an operator token to its instruction operator.
    pub fn from_token(kind: TokenKind) -> Option<BinOp> {
        match kind {
            TokenKind::Plus => Some(BinOp::Add),
            TokenKind::Minus => Some(BinOp::Sub),
            TokenKind::Star => Some(BinOp::Mul),
            TokenKind::Slash => Some(BinOp::Div),
            TokenKind::Percent => Some(BinOp::Rem),
            TokenKind::PercentPercent => Some(BinOp::FloorMod),
            TokenKind::Amp => Some(BinOp::BitAnd),
            TokenKind::Pipe => Some(BinOp::BitOr),
            TokenKind::Caret => Some(BinOp::BitXor),
            TokenKind::Shl => Some(BinOp::Shl),
            TokenKind::Shr => Some(BinOp::Shr),
            TokenKind::ShrUnsigned => Some(BinOp::ShrUnsigned),
            TokenKind::Lt => Some(BinOp::Lt),
            TokenKind::Gt => Some(BinOp::Gt),
            TokenKind::LtEq => Some(BinOp::LtEq),
            TokenKind::GtEq => Some(BinOp::GtEq),
            TokenKind::EqEq => Some(BinOp::Eq),
            TokenKind::NotEq => Some(BinOp::NotEq),
            _ => None,
        }
    }

    /// Operators defined only on integers.
    pub fn integer_only(self) -> bool {
        matches!(
            self,
            BinOp::Rem
                | BinOp::FloorMod
                | BinOp::BitAnd
                | BinOp::BitOr
                | BinOp::BitXor
                | BinOp::Shl
                | BinOp::Shr
                | BinOp::ShrUnsigned
        )
    }

    /// Operators producing an `i32` truth value.
    pub fn comparison(self) -> bool {
        matches!(
            self,
            BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq | BinOp::Eq | BinOp::NotEq
        )
    }

    /// Source spelling, for diagnostics.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::FloorMod => "%%",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::ShrUnsigned => ">>>",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
        }
    }
}

/// The closed set of instruction kinds, operands typed per kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum InstKind {
    /// Integer constant, narrowed to 64 bits and split into two 32-bit
    /// halves, sign-extended per the base primitive's signedness.
    IntConst { lo: u32, hi: u32 },
    /// Float constant referencing the float pool.
    FloatConst { value: FloatId },
    /// Reference to a bound symbol.
    VarRef { symbol: SymbolId },
    /// Bind a checked value to a symbol.
    Bind { symbol: SymbolId, value: InstId },
    /// Bind the match scrutinee to a pattern symbol.
    PatternBind { symbol: SymbolId, value: InstId },
    /// `~` on an integer operand.
    BitwiseNot { operand: InstId },
    /// `-` on a non-literal operand.
    Negate { operand: InstId },
    /// Arithmetic/bitwise/comparison operation.
    BinaryOp { op: BinOp, lhs: InstId, rhs: InstId },
    /// `&&` over integer operands, producing `i32`.
    LogicalAnd { lhs: InstId, rhs: InstId },
    /// `||` over integer operands, producing `i32`.
    LogicalOr { lhs: InstId, rhs: InstId },
    /// Record field or constant list element access.
    FieldAccess { base: InstId, index: u32 },
    /// Forward function declaration.
    FuncDecl { func: FuncId },
    /// Function definition; the body is the function entry's inst range.
    FuncDef { func: FuncId, body: InstId },
    /// Call; arguments are the `argc` instructions checked before this one.
    Call { callee: InstId, argc: u32 },
    /// One checked match arm.
    MatchArm { pattern: NodeId, body: InstId },
    /// The match itself, after all arms.
    Match { scrutinee: InstId, arms: u32 },
    /// Runtime trap.
    Panic,
}

/// One emitted instruction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Inst {
    pub kind: InstKind,
    /// Back-reference to the parse node this instruction came from.
    pub node: NodeId,
    pub ty: TypeId,
}

/// Append-only instruction store.
#[derive(Debug, Default)]
pub struct InstStore {
    insts: Vec<Inst>,
}

impl InstStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction, returning its id.
    pub fn add(&mut self, kind: InstKind, node: NodeId, ty: TypeId) -> InstId {
        let id = InstId::new(self.insts.len());
        self.insts.push(Inst { kind, node, ty });
        id
    }

    /// Look up an instruction by id.
    ///
    /// # Panics
    ///
    /// Panics if the id was not produced by this store.
    pub fn get(&self, id: InstId) -> &Inst {
        &self.insts[id.index()]
    }

    /// Number of instructions emitted so far.
    pub fn count(&self) -> usize {
        self.insts.len()
    }

    /// All instructions in emission order.
    pub fn as_slice(&self) -> &[Inst] {
        &self.insts
    }
}

/// Pool of float constants referenced by `FloatConst` instructions.
#[derive(Debug, Default)]
pub struct FloatPool {
    values: Vec<f64>,
}

impl FloatPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, returning its id.
    pub fn add(&mut self, value: f64) -> FloatId {
        let id = FloatId::new(self.values.len());
        self.values.push(value);
        id
    }

    /// Look up a value by id.
    pub fn get(&self, id: FloatId) -> f64 {
        self.values[id.index()]
    }

    /// Number of pooled values.
    pub fn count(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::TY_I32;

    #[test]
    fn binop_classification() {
        assert!(BinOp::Rem.integer_only());
        assert!(BinOp::ShrUnsigned.integer_only());
        assert!(!BinOp::Add.integer_only());
        assert!(BinOp::Lt.comparison());
        assert!(!BinOp::Shl.comparison());
    }

    #[test]
    fn binop_from_token_covers_the_operator_set() {
        assert_eq!(BinOp::from_token(TokenKind::PercentPercent), Some(BinOp::FloorMod));
        assert_eq!(BinOp::from_token(TokenKind::ShrUnsigned), Some(BinOp::ShrUnsigned));
        assert_eq!(BinOp::from_token(TokenKind::NotEq), Some(BinOp::NotEq));
        assert_eq!(BinOp::from_token(TokenKind::Colon), None);
    }

    #[test]
    fn inst_ids_increase_with_emission_order() {
        let mut insts = InstStore::new();
        let a = insts.add(InstKind::IntConst { lo: 1, hi: 0 }, NodeId(0), TY_I32);
        let b = insts.add(InstKind::IntConst { lo: 2, hi: 0 }, NodeId(1), TY_I32);
        assert!(a < b);
        assert_eq!(insts.count(), 2);
        assert_eq!(insts.get(a).kind, InstKind::IntConst { lo: 1, hi: 0 });
    }

    #[test]
    fn float_pool_round_trips() {
        let mut pool = FloatPool::new();
        let id = pool.add(3.5);
        assert_eq!(pool.get(id), 3.5);
        assert_eq!(pool.count(), 1);
    }
}
