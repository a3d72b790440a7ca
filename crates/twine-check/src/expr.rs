//! Bidirectional expression checking.
//!
//! Two entry points: [`Checker::check_expr`] demands an exact expected type
//! and [`Checker::infer_expr`] synthesizes one bottom-up (int literals
//! default to `i32`, float literals to `f64`, comparisons produce `i32`).
//! Both return a [`Checked`] pair of emitted instruction and type; failed
//! checks report one diagnostic, return the `invalid` type, and emit
//! nothing, so callers propagate by early-returning rather than cascading.

use num_bigint::BigInt;

use twine_common::diag::DiagCode;
use twine_common::ids::{NodeId, StringId, TypeId};
use twine_common::token::TokenKind;
use twine_parser::node::NodeKind;

use crate::inst::{BinOp, InstKind};
use crate::literal::{int_bounds, overflows_f32, parse_int_literal, split_halves, IntLitError};
use crate::ty::{TY_F32, TY_F64, TY_I32};
use crate::{Checked, Checker};

impl Checker<'_> {
    /// Check `node` against a known expected type (checking mode).
    pub(crate) fn check_expr(&mut self, node: NodeId, expected: TypeId) -> Checked {
        self.check_expr_impl(node, Some(expected))
    }

    /// Infer the type of `node` bottom-up (inference mode).
    pub(crate) fn infer_expr(&mut self, node: NodeId) -> Checked {
        self.check_expr_impl(node, None)
    }

    fn check_expr_impl(&mut self, node: NodeId, expected: Option<TypeId>) -> Checked {
        match self.node(node).kind {
            NodeKind::IntLiteral => self.check_int_literal(node, expected, false),
            NodeKind::FloatLiteral => self.check_float_literal(node, expected, false),
            NodeKind::Identifier => self.check_identifier(node, expected),
            NodeKind::UnaryExpr => self.check_unary(node, expected),
            NodeKind::ParenExpr => {
                let child = self.children(node)[0];
                self.check_expr_impl(child, expected)
            }
            NodeKind::BinaryExpr => self.check_binary(node, expected),
            NodeKind::CompareChain => self.check_compare_chain(node, expected),
            NodeKind::FieldAccess => self.check_field_access(node, expected),
            NodeKind::IndexAccess => self.check_index_access(node, expected),
            NodeKind::ListLiteral => self.check_list_literal(node, expected),
            NodeKind::FuncCall => self.check_call(node, expected),
            other => unreachable!("node kind {other:?} is not an expression"),
        }
    }

    // ── Literals ───────────────────────────────────────────────────────

    /// Integer literal: arbitrary-precision evaluation, base-range check,
    /// refinement-constraint check, then narrowing to two 32-bit halves.
    /// `negate` folds a wrapping unary minus into the value.
    pub(crate) fn check_int_literal(
        &mut self,
        node: NodeId,
        expected: Option<TypeId>,
        negate: bool,
    ) -> Checked {
        let text = self.literal_text(node).to_owned();

        let target = match expected {
            None => TY_I32,
            Some(t) if self.types.is_integer(t) => t,
            Some(t) if self.types.is_float(t) => {
                // Scientific notation may denote a float; plain digits in
                // float position are a kind mismatch.
                if text.contains(['e', 'E']) {
                    return self.check_float_value(node, &text, t, negate);
                }
                let diag = self
                    .diag(DiagCode::LiteralKindMismatch, node)
                    .with_arg("expected", self.type_name(t))
                    .with_arg("found", "an integer literal");
                self.diags.push(diag);
                return Checked::invalid();
            }
            Some(t) => {
                let diag = self
                    .diag(DiagCode::LiteralKindMismatch, node)
                    .with_arg("expected", self.type_name(t))
                    .with_arg("found", "an integer literal");
                self.diags.push(diag);
                return Checked::invalid();
            }
        };

        let value = match parse_int_literal(&text) {
            Ok(v) => {
                if negate {
                    -v
                } else {
                    v
                }
            }
            Err(IntLitError::NegativeExponent) => {
                let diag = self
                    .diag(DiagCode::LiteralKindMismatch, node)
                    .with_arg("expected", self.type_name(target))
                    .with_arg("found", "a literal with a negative exponent");
                self.diags.push(diag);
                return Checked::invalid();
            }
            Err(IntLitError::Malformed) => {
                let diag = self
                    .diag(DiagCode::LiteralKindMismatch, node)
                    .with_arg("expected", self.type_name(target))
                    .with_arg("found", "a malformed literal");
                self.diags.push(diag);
                return Checked::invalid();
            }
        };
        let display = if negate { format!("-{text}") } else { text };

        let base = self.types.wasm_type(target);
        let (min, max) = int_bounds(base);
        if value < min || value > max {
            let diag = self
                .diag(DiagCode::IntOutOfRange, node)
                .with_arg("value", display)
                .with_arg("type", self.type_name(base));
            self.diags.push(diag);
            return Checked::invalid();
        }

        if let Some((cmin, cmax)) = self.types.constraints(target) {
            if let Some(cmin) = cmin {
                if value < cmin {
                    let diag = self
                        .diag(DiagCode::ConstraintViolation, node)
                        .with_arg("value", value.to_string())
                        .with_arg("bound", "min")
                        .with_arg("limit", cmin.to_string());
                    self.diags.push(diag);
                    return Checked::invalid();
                }
            }
            if let Some(cmax) = cmax {
                if value > cmax {
                    let diag = self
                        .diag(DiagCode::ConstraintViolation, node)
                        .with_arg("value", value.to_string())
                        .with_arg("bound", "max")
                        .with_arg("limit", cmax.to_string());
                    self.diags.push(diag);
                    return Checked::invalid();
                }
            }
        }

        let (lo, hi) = split_halves(&value);
        let inst = self.insts.add(InstKind::IntConst { lo, hi }, node, target);
        Checked::ok(inst, target)
    }

    /// Float literal. `negate` folds a wrapping unary minus.
    pub(crate) fn check_float_literal(
        &mut self,
        node: NodeId,
        expected: Option<TypeId>,
        negate: bool,
    ) -> Checked {
        let text = self.literal_text(node).to_owned();
        let target = match expected {
            None => TY_F64,
            Some(t) if self.types.is_float(t) => t,
            Some(t) => {
                let diag = self
                    .diag(DiagCode::LiteralKindMismatch, node)
                    .with_arg("expected", self.type_name(t))
                    .with_arg("found", "a float literal");
                self.diags.push(diag);
                return Checked::invalid();
            }
        };
        self.check_float_value(node, &text, target, negate)
    }

    /// Shared float path: parse as double, reject f32 overflow, pool the
    /// value, and emit `FloatConst`.
    fn check_float_value(&mut self, node: NodeId, text: &str, target: TypeId, negate: bool) -> Checked {
        let Ok(parsed) = text.parse::<f64>() else {
            let diag = self
                .diag(DiagCode::LiteralKindMismatch, node)
                .with_arg("expected", self.type_name(target))
                .with_arg("found", "a malformed literal");
            self.diags.push(diag);
            return Checked::invalid();
        };
        let value = if negate { -parsed } else { parsed };

        if target == TY_F32 && overflows_f32(value) {
            let display = if negate { format!("-{text}") } else { text.to_string() };
            let diag = self
                .diag(DiagCode::F32Overflow, node)
                .with_arg("type", "f32")
                .with_arg("value", display);
            self.diags.push(diag);
            return Checked::invalid();
        }

        let pooled = self.floats.add(value);
        let inst = self
            .insts
            .add(InstKind::FloatConst { value: pooled }, node, target);
        Checked::ok(inst, target)
    }

    // ── Names ──────────────────────────────────────────────────────────

    fn check_identifier(&mut self, node: NodeId, expected: Option<TypeId>) -> Checked {
        let name = self.ident_of(node);
        let Some(symbol) = self.scopes.lookup(name) else {
            let text = self.interner.get(name).to_owned();
            let diag = self.diag(DiagCode::UnknownName, node).with_arg("name", text);
            self.diags.push(diag);
            return Checked::invalid();
        };
        let ty = self.symbols.get(symbol).ty;
        if let Some(exp) = expected {
            if exp != ty {
                let diag = self
                    .diag(DiagCode::TypeMismatch, node)
                    .with_arg("expected", self.type_name(exp))
                    .with_arg("found", self.type_name(ty));
                self.diags.push(diag);
                return Checked::invalid();
            }
        }
        let inst = self.insts.add(InstKind::VarRef { symbol }, node, ty);
        Checked::ok(inst, ty)
    }

    // ── Unary operators ────────────────────────────────────────────────

    fn check_unary(&mut self, node: NodeId, expected: Option<TypeId>) -> Checked {
        let op = self.token_of(node).kind;
        let child = self.children(node)[0];
        match op {
            TokenKind::Tilde => {
                let result = match expected {
                    Some(t) => self.check_expr(child, t),
                    None => self.infer_expr(child),
                };
                if result.is_invalid() {
                    return Checked::invalid();
                }
                if !self.types.is_integer(result.ty) {
                    let diag = self
                        .diag(DiagCode::NonIntegerOperand, node)
                        .with_arg("op", "~")
                        .with_arg("type", self.type_name(result.ty));
                    self.diags.push(diag);
                    return Checked::invalid();
                }
                let Some(operand) = result.inst else {
                    return Checked::invalid();
                };
                let inst = self
                    .insts
                    .add(InstKind::BitwiseNot { operand }, node, result.ty);
                Checked::ok(inst, result.ty)
            }
            TokenKind::Minus => match self.node(child).kind {
                // Negating a literal folds into the constant.
                NodeKind::IntLiteral => self.check_int_literal(child, expected, true),
                NodeKind::FloatLiteral => self.check_float_literal(child, expected, true),
                _ => {
                    let result = match expected {
                        Some(t) => self.check_expr(child, t),
                        None => self.infer_expr(child),
                    };
                    if result.is_invalid() {
                        return Checked::invalid();
                    }
                    let Some(operand) = result.inst else {
                        return Checked::invalid();
                    };
                    let inst = self.insts.add(InstKind::Negate { operand }, node, result.ty);
                    Checked::ok(inst, result.ty)
                }
            },
            other => unreachable!("token kind {other:?} is not a unary operator"),
        }
    }

    // ── Binary operators ───────────────────────────────────────────────

    fn check_binary(&mut self, node: NodeId, expected: Option<TypeId>) -> Checked {
        let op_token = self.token_of(node).kind;
        let kids = self.children(node);
        let lhs = self.infer_expr(kids[0]);
        let rhs = self.infer_expr(kids[1]);
        if lhs.is_invalid() || rhs.is_invalid() {
            return Checked::invalid();
        }
        if lhs.ty != rhs.ty {
            let diag = self
                .diag(DiagCode::OperandTypeMismatch, node)
                .with_arg("left", self.type_name(lhs.ty))
                .with_arg("right", self.type_name(rhs.ty));
            self.diags.push(diag);
            return Checked::invalid();
        }
        let (Some(left), Some(right)) = (lhs.inst, rhs.inst) else {
            return Checked::invalid();
        };

        match op_token {
            TokenKind::AmpAmp | TokenKind::PipePipe => {
                if !self.types.is_integer(lhs.ty) {
                    let symbol = if op_token == TokenKind::AmpAmp { "&&" } else { "||" };
                    let diag = self
                        .diag(DiagCode::NonIntegerLogicalOperand, node)
                        .with_arg("op", symbol)
                        .with_arg("type", self.type_name(lhs.ty));
                    self.diags.push(diag);
                    return Checked::invalid();
                }
                if let Some(exp) = expected {
                    if exp != TY_I32 {
                        let diag = self
                            .diag(DiagCode::TypeMismatch, node)
                            .with_arg("expected", self.type_name(exp))
                            .with_arg("found", "i32");
                        self.diags.push(diag);
                        return Checked::invalid();
                    }
                }
                let kind = if op_token == TokenKind::AmpAmp {
                    InstKind::LogicalAnd { lhs: left, rhs: right }
                } else {
                    InstKind::LogicalOr { lhs: left, rhs: right }
                };
                let inst = self.insts.add(kind, node, TY_I32);
                Checked::ok(inst, TY_I32)
            }
            _ => {
                let op = BinOp::from_token(op_token).expect("binary operator token");
                if op.integer_only() && !self.types.is_integer(lhs.ty) {
                    let diag = self
                        .diag(DiagCode::NonIntegerOperand, node)
                        .with_arg("op", op.symbol())
                        .with_arg("type", self.type_name(lhs.ty));
                    self.diags.push(diag);
                    return Checked::invalid();
                }
                let result_ty = if op.comparison() { TY_I32 } else { lhs.ty };
                if let Some(exp) = expected {
                    if exp != result_ty {
                        let diag = self
                            .diag(DiagCode::TypeMismatch, node)
                            .with_arg("expected", self.type_name(exp))
                            .with_arg("found", self.type_name(result_ty));
                        self.diags.push(diag);
                        return Checked::invalid();
                    }
                }
                let inst = self.insts.add(
                    InstKind::BinaryOp { op, lhs: left, rhs: right },
                    node,
                    result_ty,
                );
                Checked::ok(inst, result_ty)
            }
        }
    }

    /// N-ary relational chain. All operands must share the first operand's
    /// type; the result is `i32`. The emitted instruction covers the first
    /// operand pair — the backend owns the full chain semantics.
    fn check_compare_chain(&mut self, node: NodeId, expected: Option<TypeId>) -> Checked {
        let kids = self.children(node);
        debug_assert!(kids.len() >= 2, "a chain has at least two operands");

        let first = self.infer_expr(kids[0]);
        if first.is_invalid() {
            return Checked::invalid();
        }
        let mut insts = vec![first.inst];
        for &operand in &kids[1..] {
            let result = self.infer_expr(operand);
            if result.is_invalid() {
                return Checked::invalid();
            }
            if result.ty != first.ty {
                let diag = self
                    .diag(DiagCode::OperandTypeMismatch, operand)
                    .with_arg("left", self.type_name(first.ty))
                    .with_arg("right", self.type_name(result.ty));
                self.diags.push(diag);
                return Checked::invalid();
            }
            insts.push(result.inst);
        }

        if let Some(exp) = expected {
            if exp != TY_I32 {
                let diag = self
                    .diag(DiagCode::TypeMismatch, node)
                    .with_arg("expected", self.type_name(exp))
                    .with_arg("found", "i32");
                self.diags.push(diag);
                return Checked::invalid();
            }
        }

        let op = BinOp::from_token(self.token_of(node).kind).expect("chain comparator token");
        let (Some(lhs), Some(rhs)) = (insts[0], insts[1]) else {
            return Checked::invalid();
        };
        let inst = self
            .insts
            .add(InstKind::BinaryOp { op, lhs, rhs }, node, TY_I32);
        Checked::ok(inst, TY_I32)
    }

    // ── Field access ───────────────────────────────────────────────────

    /// Collect a pure `root.f1.f2…` identifier path, root-first.
    fn flatten_path(&self, node: NodeId) -> Option<(Vec<StringId>, NodeId)> {
        match self.node(node).kind {
            NodeKind::Identifier => Some((vec![self.ident_of(node)], node)),
            NodeKind::FieldAccess => {
                let base = self.children(node)[0];
                let (mut path, root) = self.flatten_path(base)?;
                path.push(self.ident_of(node));
                Some((path, root))
            }
            _ => None,
        }
    }

    fn check_field_access(&mut self, node: NodeId, expected: Option<TypeId>) -> Checked {
        // Flattened resolution first: `p.x` may be the symbol `p_x`.
        if let Some((path, root)) = self.flatten_path(node) {
            let mut name = path[0];
            for &part in &path[1..] {
                let text = self.interner.get(part).to_owned();
                name = self.interner.concat(name, &text);
            }
            if let Some(symbol) = self.scopes.lookup(name) {
                let ty = self.symbols.get(symbol).ty;
                if let Some(exp) = expected {
                    if exp != ty {
                        let diag = self
                            .diag(DiagCode::TypeMismatch, node)
                            .with_arg("expected", self.type_name(exp))
                            .with_arg("found", self.type_name(ty));
                        self.diags.push(diag);
                        return Checked::invalid();
                    }
                }
                let inst = self.insts.add(InstKind::VarRef { symbol }, node, ty);
                return Checked::ok(inst, ty);
            }
            // No flattened symbol: the root identifier must at least exist.
            if self.scopes.lookup(path[0]).is_none() {
                let text = self.interner.get(path[0]).to_owned();
                let diag = self.diag(DiagCode::UnknownName, root).with_arg("name", text);
                self.diags.push(diag);
                return Checked::invalid();
            }
        }

        let base_node = self.children(node)[0];
        let base = self.infer_expr(base_node);
        if base.is_invalid() {
            return Checked::invalid();
        }
        if !self.types.is_record(base.ty) {
            let diag = self
                .diag(DiagCode::InvalidAccessBase, node)
                .with_arg("type", self.type_name(base.ty));
            self.diags.push(diag);
            return Checked::invalid();
        }

        let field_name = self.ident_of(node);
        let Some((index, field_ty)) = self.types.field(base.ty, field_name).map(|f| (f.index, f.ty))
        else {
            let text = self.interner.get(field_name).to_owned();
            let diag = self
                .diag(DiagCode::NoSuchField, node)
                .with_arg("field", text)
                .with_arg("type", self.type_name(base.ty));
            self.diags.push(diag);
            return Checked::invalid();
        };

        if let Some(exp) = expected {
            if exp != field_ty {
                let diag = self
                    .diag(DiagCode::TypeMismatch, node)
                    .with_arg("expected", self.type_name(exp))
                    .with_arg("found", self.type_name(field_ty));
                self.diags.push(diag);
                return Checked::invalid();
            }
        }
        let Some(base_inst) = base.inst else {
            return Checked::invalid();
        };
        let inst = self.insts.add(
            InstKind::FieldAccess { base: base_inst, index },
            node,
            field_ty,
        );
        Checked::ok(inst, field_ty)
    }

    // ── Index access ───────────────────────────────────────────────────

    fn check_index_access(&mut self, node: NodeId, expected: Option<TypeId>) -> Checked {
        let kids = self.children(node);
        let base_node = kids[0];
        let index_node = kids[1];

        if self.node(index_node).kind != NodeKind::IntLiteral {
            let diag = self.diag(DiagCode::NonConstantIndex, index_node);
            self.diags.push(diag);
            return Checked::invalid();
        }
        let text = self.literal_text(index_node).to_owned();
        let Ok(index) = parse_int_literal(&text) else {
            let diag = self.diag(DiagCode::NonConstantIndex, index_node);
            self.diags.push(diag);
            return Checked::invalid();
        };

        // Early resolution for flattened list bindings: `xs[1]` is `xs_1`.
        if self.node(base_node).kind == NodeKind::Identifier {
            let base_name = self.ident_of(base_node);
            if let Some(list_ty) = self.scopes.list_binding(base_name) {
                let (_, size) = self.types.list_info(list_ty).expect("registry holds lists");
                if index < BigInt::from(0) || index >= BigInt::from(size) {
                    let diag = self
                        .diag(DiagCode::IndexOutOfRange, node)
                        .with_arg("index", index.to_string())
                        .with_arg("type", self.type_name(list_ty));
                    self.diags.push(diag);
                    return Checked::invalid();
                }
                let flat = self.interner.concat(base_name, &index.to_string());
                if let Some(symbol) = self.scopes.lookup(flat) {
                    let ty = self.symbols.get(symbol).ty;
                    if let Some(exp) = expected {
                        if exp != ty {
                            let diag = self
                                .diag(DiagCode::TypeMismatch, node)
                                .with_arg("expected", self.type_name(exp))
                                .with_arg("found", self.type_name(ty));
                            self.diags.push(diag);
                            return Checked::invalid();
                        }
                    }
                    let inst = self.insts.add(InstKind::VarRef { symbol }, node, ty);
                    return Checked::ok(inst, ty);
                }
            }
        }

        let base = self.infer_expr(base_node);
        if base.is_invalid() {
            return Checked::invalid();
        }
        let Some((elem, size)) = self.types.list_info(base.ty) else {
            let diag = self
                .diag(DiagCode::InvalidAccessBase, node)
                .with_arg("type", self.type_name(base.ty));
            self.diags.push(diag);
            return Checked::invalid();
        };
        if index < BigInt::from(0) || index >= BigInt::from(size) {
            let diag = self
                .diag(DiagCode::IndexOutOfRange, node)
                .with_arg("index", index.to_string())
                .with_arg("type", self.type_name(base.ty));
            self.diags.push(diag);
            return Checked::invalid();
        }
        if let Some(exp) = expected {
            if exp != elem {
                let diag = self
                    .diag(DiagCode::TypeMismatch, node)
                    .with_arg("expected", self.type_name(exp))
                    .with_arg("found", self.type_name(elem));
                self.diags.push(diag);
                return Checked::invalid();
            }
        }
        let Some(base_inst) = base.inst else {
            return Checked::invalid();
        };
        let index = u32::try_from(&index).expect("bounds-checked index fits u32");
        let inst = self.insts.add(
            InstKind::FieldAccess { base: base_inst, index },
            node,
            elem,
        );
        Checked::ok(inst, elem)
    }

    // ── List literals ──────────────────────────────────────────────────

    /// Check a list literal's elements against a list type. Returns the
    /// element instructions, or `None` after reporting a size or element
    /// failure.
    pub(crate) fn check_list_elements(
        &mut self,
        node: NodeId,
        list_ty: TypeId,
    ) -> Option<Vec<twine_common::ids::InstId>> {
        let (elem, size) = self.types.list_info(list_ty).expect("caller passes a list type");
        let kids = self.children(node);
        if kids.len() != size as usize {
            let diag = self
                .diag(DiagCode::ListSizeMismatch, node)
                .with_arg("found", kids.len().to_string())
                .with_arg("type", self.type_name(list_ty))
                .with_arg("expected", size.to_string());
            self.diags.push(diag);
            return None;
        }
        let mut insts = Vec::with_capacity(kids.len());
        let mut ok = true;
        for &element in &kids {
            let result = self.check_expr(element, elem);
            match result.inst {
                Some(inst) if !result.is_invalid() => insts.push(inst),
                _ => ok = false,
            }
        }
        if ok {
            Some(insts)
        } else {
            None
        }
    }

    /// List literals exist only in checking mode; without an expected list
    /// type there is nothing to size them against.
    fn check_list_literal(&mut self, node: NodeId, expected: Option<TypeId>) -> Checked {
        let Some(exp) = expected else {
            let diag = self
                .diag(DiagCode::TypeMismatch, node)
                .with_arg("expected", "a declared list type")
                .with_arg("found", "a list literal");
            self.diags.push(diag);
            return Checked::invalid();
        };
        if !self.types.is_list(exp) {
            let diag = self
                .diag(DiagCode::TypeMismatch, node)
                .with_arg("expected", self.type_name(exp))
                .with_arg("found", "a list literal");
            self.diags.push(diag);
            return Checked::invalid();
        }
        match self.check_list_elements(node, exp) {
            Some(insts) => {
                let last = *insts.last().expect("list sizes are positive");
                Checked::ok(last, exp)
            }
            None => Checked::invalid(),
        }
    }
}
