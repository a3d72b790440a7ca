//! Match-expression checking.
//!
//! A match is a binding `name: T = match scrutinee` followed by indented
//! `pattern -> body` arms. The scrutinee is checked against `T` up front;
//! each arm gets its own scope for pattern bindings and checks its body
//! against `T`. The last arm must be a catch-all. Finalization emits one
//! `MatchArm` per arm, the `Match`, and the result binding.

use twine_common::diag::DiagCode;
use twine_common::ids::{NodeId, StringId, TypeId};
use twine_parser::node::NodeKind;

use crate::blocks::MatchContext;
use crate::inst::InstKind;
use crate::ty::TY_INVALID;
use crate::Checker;

impl Checker<'_> {
    /// Set up the match context for `name: T = match scrutinee`.
    pub(crate) fn open_match(
        &mut self,
        binding: StringId,
        node: NodeId,
        expected: TypeId,
        match_node: NodeId,
        level: u32,
    ) {
        let scrutinee_node = self.children(match_node)[0];
        let scrutinee = self.check_expr(scrutinee_node, expected);
        // An invalid scrutinee poisons the match: arms are still walked
        // for their own diagnostics, but nothing is emitted.
        let (inst, ty) = if scrutinee.is_invalid() {
            (None, TY_INVALID)
        } else {
            (scrutinee.inst, scrutinee.ty)
        };
        self.match_ctx = Some(MatchContext {
            scrutinee: inst,
            scrutinee_ty: ty,
            expected,
            arms: Vec::new(),
            binding,
            node,
            match_node,
            child_level: level + 1,
        });
    }

    /// Check one `pattern -> body` line.
    pub(crate) fn check_match_arm(&mut self, node: NodeId, level: u32) {
        let in_match = self
            .match_ctx
            .as_ref()
            .is_some_and(|ctx| ctx.child_level == level);
        if !in_match {
            let diag = self.diag(DiagCode::ArmOutsideMatch, node);
            self.diags.push(diag);
            return;
        }
        let mut ctx = self.match_ctx.take().expect("checked above");
        let kids = self.children(node);
        let pattern = kids[0];
        let body_node = kids[1];

        self.scopes.push();
        self.check_pattern(pattern, &ctx);
        let body = self.check_expr(body_node, ctx.expected);
        self.scopes.pop();

        ctx.arms.push((pattern, body.inst));
        self.match_ctx = Some(ctx);
    }

    fn check_pattern(&mut self, pattern: NodeId, ctx: &MatchContext) {
        match self.node(pattern).kind {
            NodeKind::LiteralPattern => {
                if ctx.scrutinee_ty != TY_INVALID && !self.types.is_integer(ctx.scrutinee_ty) {
                    let diag = self
                        .diag(DiagCode::NonIntegerLiteralPattern, pattern)
                        .with_arg("type", self.type_name(ctx.scrutinee_ty));
                    self.diags.push(diag);
                }
            }
            NodeKind::WildcardPattern => {}
            NodeKind::BindingPattern => {
                let name = self.ident_of(pattern);
                let symbol = self.symbols.add(name, pattern, ctx.scrutinee_ty);
                self.scopes.insert(name, symbol);
                if let Some(scrutinee) = ctx.scrutinee {
                    self.insts.add(
                        InstKind::PatternBind { symbol, value: scrutinee },
                        pattern,
                        ctx.scrutinee_ty,
                    );
                }
            }
            NodeKind::OrPattern => {
                for child in self.children(pattern) {
                    self.check_pattern(child, ctx);
                }
            }
            other => unreachable!("node kind {other:?} is not a pattern"),
        }
    }

    /// A pattern guaranteed to match any scrutinee value: the wildcard, a
    /// binding, or an or-pattern containing one.
    fn is_catch_all(&self, pattern: NodeId) -> bool {
        match self.node(pattern).kind {
            NodeKind::WildcardPattern | NodeKind::BindingPattern => true,
            NodeKind::OrPattern => self
                .children(pattern)
                .iter()
                .any(|&child| self.is_catch_all(child)),
            _ => false,
        }
    }

    /// Close the match: exhaustiveness, then `MatchArm`* + `Match` + the
    /// result binding.
    pub(crate) fn finalize_match(&mut self, ctx: MatchContext) {
        let exhaustive = ctx
            .arms
            .last()
            .is_some_and(|(pattern, _)| self.is_catch_all(*pattern));
        if !exhaustive {
            let diag = self.diag(DiagCode::NonExhaustiveMatch, ctx.match_node);
            self.diags.push(diag);
            return;
        }
        let Some(scrutinee) = ctx.scrutinee else { return };

        let mut arm_count = 0u32;
        for (pattern, body) in &ctx.arms {
            if let Some(body) = body {
                self.insts.add(
                    InstKind::MatchArm { pattern: *pattern, body: *body },
                    *pattern,
                    ctx.expected,
                );
                arm_count += 1;
            }
        }
        let match_inst = self.insts.add(
            InstKind::Match { scrutinee, arms: arm_count },
            ctx.match_node,
            ctx.expected,
        );
        let symbol = self.symbols.add(ctx.binding, ctx.node, ctx.expected);
        self.scopes.insert(ctx.binding, symbol);
        self.insts.add(
            InstKind::Bind { symbol, value: match_inst },
            ctx.node,
            ctx.expected,
        );
    }
}
