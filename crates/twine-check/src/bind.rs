//! Statement checking: bindings, record declarations, record literals,
//! nested record initializers, assignments, and type resolution.
//!
//! The driver walks the parser's statement list in source order. Before a
//! statement is handled, every context expecting deeper-indented children
//! is finalized, so a dedent is what closes record declarations, record
//! literals, and matches.

use num_bigint::BigInt;

use twine_common::diag::DiagCode;
use twine_common::ids::{NodeId, StringId, TypeId};
use twine_common::token::TokenKind;
use twine_parser::node::NodeKind;
use twine_parser::Parse;

use crate::blocks::{BlockContext, FieldValue};
use crate::inst::InstKind;
use crate::ty::{Field, TY_F32, TY_F64, TY_I32, TY_I64, TY_INVALID, TY_NONE};
use crate::literal::parse_int_literal;
use crate::Checker;

impl Checker<'_> {
    /// Check every statement, closing indentation-scoped contexts as the
    /// level drops, and finalize whatever is still open at end of input.
    pub(crate) fn check_program(&mut self, parse: &Parse) {
        for stmt in &parse.stmts {
            self.close_contexts(stmt.level);
            self.check_stmt(stmt.node, stmt.level);
        }
        self.close_contexts(0);
    }

    /// Finalize contexts whose child lines sit deeper than `level`.
    fn close_contexts(&mut self, level: u32) {
        if let Some(ctx) = &self.match_ctx {
            if ctx.child_level > level {
                let ctx = self.match_ctx.take().expect("just observed");
                self.finalize_match(ctx);
            }
        }
        while let Some(top) = self.blocks.last() {
            if top.child_level() <= level {
                break;
            }
            let ctx = self.blocks.pop().expect("just observed");
            self.finalize_block(ctx);
        }
    }

    fn check_stmt(&mut self, node: NodeId, level: u32) {
        match self.node(node).kind {
            NodeKind::TypeDecl => {
                let name = self.ident_of(node);
                self.blocks.push(BlockContext::TypeDecl {
                    name,
                    node,
                    fields: Vec::new(),
                    child_level: level + 1,
                });
            }
            NodeKind::Binding => self.check_binding(node, level),
            NodeKind::Assign => self.check_assign(node, level),
            NodeKind::FuncDef => self.check_func_def(node),
            NodeKind::MatchArm => self.check_match_arm(node, level),
            NodeKind::Panic => {
                self.insts.add(InstKind::Panic, node, TY_NONE);
            }
            other => unreachable!("node kind {other:?} is not a statement"),
        }
    }

    // ── Bindings ───────────────────────────────────────────────────────

    fn check_binding(&mut self, node: NodeId, level: u32) {
        let kids = self.children(node);
        let name = self.ident_of(node);

        // Inside a record declaration, a line `name: Type` is a field.
        if matches!(
            self.blocks.last(),
            Some(BlockContext::TypeDecl { child_level, .. }) if *child_level == level
        ) {
            self.check_field_decl(node, name, &kids);
            return;
        }

        // Inside a record literal, `field: RecordType` opens a nested init.
        if matches!(
            self.blocks.last(),
            Some(BlockContext::RecordLiteral { child_level, .. }
                | BlockContext::NestedRecordInit { child_level, .. }) if *child_level == level
        ) {
            self.open_nested_record(node, level, name, &kids);
            return;
        }

        let ty = self.resolve_type(kids[0]);

        if kids.len() == 1 {
            if ty == TY_INVALID {
                // Keep a poisoned context so indented init lines that may
                // follow do not cascade into unknown-name errors.
                self.blocks.push(BlockContext::RecordLiteral {
                    base: name,
                    node,
                    ty: TY_INVALID,
                    inits: Vec::new(),
                    child_level: level + 1,
                });
                return;
            }
            if self.types.is_record(ty) {
                let field_count = self.types.fields(ty).len();
                self.blocks.push(BlockContext::RecordLiteral {
                    base: name,
                    node,
                    ty,
                    inits: vec![None; field_count],
                    child_level: level + 1,
                });
            } else if self.types.is_func(ty) {
                self.declare_func(name, node, ty);
            } else {
                let text = self.interner.get(name).to_owned();
                let diag = self
                    .diag(DiagCode::SignatureMismatch, node)
                    .with_arg("detail", format!("binding `{text}` requires an initializer"));
                self.diags.push(diag);
            }
            return;
        }

        if ty == TY_INVALID {
            return;
        }
        let init = kids[1];

        if self.node(init).kind == NodeKind::MatchExpr {
            self.open_match(name, node, ty, init, level);
            return;
        }

        if self.types.is_list(ty) && self.node(init).kind == NodeKind::ListLiteral {
            self.check_list_binding(name, node, ty, init);
            return;
        }

        let result = self.check_expr(init, ty);
        let Some(value) = result.inst else { return };
        let symbol = self.symbols.add(name, node, ty);
        self.scopes.insert(name, symbol);
        self.insts.add(InstKind::Bind { symbol, value }, node, ty);
    }

    /// A list binding flattens into one symbol per element (`xs_0`, …)
    /// plus the base symbol and a list-registry entry for constant index
    /// resolution.
    fn check_list_binding(&mut self, name: StringId, node: NodeId, ty: TypeId, init: NodeId) {
        let Some(elements) = self.check_list_elements(init, ty) else {
            return;
        };
        let (elem_ty, _) = self.types.list_info(ty).expect("list binding has a list type");

        let base = self.symbols.add(name, node, ty);
        self.scopes.insert(name, base);
        self.scopes.register_list_binding(name, ty);

        for (i, &value) in elements.iter().enumerate() {
            let flat = self.interner.concat(name, &i.to_string());
            let symbol = self.symbols.add(flat, node, elem_ty);
            self.scopes.insert(flat, symbol);
            self.insts.add(InstKind::Bind { symbol, value }, node, elem_ty);
        }
    }

    // ── Record declarations ────────────────────────────────────────────

    fn check_field_decl(&mut self, node: NodeId, name: StringId, kids: &[NodeId]) {
        if kids.len() > 1 {
            let diag = self.diag(DiagCode::SignatureMismatch, node).with_arg(
                "detail",
                "field declarations cannot have initializers".to_string(),
            );
            self.diags.push(diag);
            return;
        }
        let ty = self.resolve_type(kids[0]);
        if ty == TY_INVALID {
            return;
        }
        let duplicate = match self.blocks.last() {
            Some(BlockContext::TypeDecl { fields, .. }) => {
                fields.iter().any(|(existing, _, _)| *existing == name)
            }
            _ => unreachable!("field declarations only occur in type declarations"),
        };
        if duplicate {
            let text = self.interner.get(name).to_owned();
            let diag = self
                .diag(DiagCode::DuplicateField, node)
                .with_arg("field", text);
            self.diags.push(diag);
            return;
        }
        if let Some(BlockContext::TypeDecl { fields, .. }) = self.blocks.last_mut() {
            fields.push((name, ty, node));
        }
    }

    // ── Record literals ────────────────────────────────────────────────

    /// `field: RecordType` inside a record-literal block: validate the
    /// field against the enclosing record and push a deeper init context.
    fn open_nested_record(&mut self, node: NodeId, level: u32, name: StringId, kids: &[NodeId]) {
        let (parent_ty, parent_base) = match self.blocks.last() {
            Some(BlockContext::RecordLiteral { ty, base, .. }) => (*ty, *base),
            Some(BlockContext::NestedRecordInit { ty, path, .. }) => (*ty, *path),
            _ => unreachable!("caller checked the top context"),
        };
        let path = {
            let text = self.interner.get(name).to_owned();
            self.interner.concat(parent_base, &text)
        };
        if parent_ty == TY_INVALID {
            // Poisoned parent; swallow this subtree quietly.
            self.blocks.push(BlockContext::NestedRecordInit {
                path,
                node,
                ty: TY_INVALID,
                inits: Vec::new(),
                child_level: level + 1,
            });
            return;
        }

        if kids.len() > 1 {
            let diag = self.diag(DiagCode::SignatureMismatch, node).with_arg(
                "detail",
                "nested field initializers declare a type, not a value".to_string(),
            );
            self.diags.push(diag);
            return;
        }

        let Some((index, field_ty)) = self.types.field(parent_ty, name).map(|f| (f.index, f.ty))
        else {
            let text = self.interner.get(name).to_owned();
            let diag = self
                .diag(DiagCode::UnknownRecordField, node)
                .with_arg("record", self.type_name(parent_ty))
                .with_arg("field", text);
            self.diags.push(diag);
            return;
        };

        let already = match self.blocks.last() {
            Some(BlockContext::RecordLiteral { inits, .. }
            | BlockContext::NestedRecordInit { inits, .. }) => inits[index as usize].is_some(),
            _ => unreachable!("caller checked the top context"),
        };
        if already {
            let text = self.interner.get(name).to_owned();
            let diag = self
                .diag(DiagCode::DuplicateField, node)
                .with_arg("field", text);
            self.diags.push(diag);
            return;
        }

        let declared = self.resolve_type(kids[0]);
        let mark = if declared == TY_INVALID {
            FieldValue::Inst(None)
        } else if declared != field_ty {
            let diag = self
                .diag(DiagCode::TypeMismatch, node)
                .with_arg("expected", self.type_name(field_ty))
                .with_arg("found", self.type_name(declared));
            self.diags.push(diag);
            FieldValue::Inst(None)
        } else if !self.types.is_record(declared) {
            let diag = self.diag(DiagCode::SignatureMismatch, node).with_arg(
                "detail",
                "nested field initializers require a record-typed field".to_string(),
            );
            self.diags.push(diag);
            FieldValue::Inst(None)
        } else {
            FieldValue::Nested
        };

        self.set_top_init_slot(index, mark);
        if mark == FieldValue::Nested {
            let field_count = self.types.fields(field_ty).len();
            self.blocks.push(BlockContext::NestedRecordInit {
                path,
                node,
                ty: field_ty,
                inits: vec![None; field_count],
                child_level: level + 1,
            });
        }
    }

    fn set_top_init_slot(&mut self, index: u32, value: FieldValue) {
        match self.blocks.last_mut() {
            Some(BlockContext::RecordLiteral { inits, .. }
            | BlockContext::NestedRecordInit { inits, .. }) => {
                inits[index as usize] = Some(value);
            }
            _ => unreachable!("caller checked the top context"),
        }
    }

    // ── Assignments and field inits ────────────────────────────────────

    fn check_assign(&mut self, node: NodeId, level: u32) {
        let name = self.ident_of(node);
        let value_node = self.children(node)[0];

        // Inside a record-literal block, `field = expr` fills a slot.
        if matches!(
            self.blocks.last(),
            Some(BlockContext::RecordLiteral { child_level, .. }
                | BlockContext::NestedRecordInit { child_level, .. }) if *child_level == level
        ) {
            self.check_field_init(node, name, value_node);
            return;
        }
        if matches!(
            self.blocks.last(),
            Some(BlockContext::TypeDecl { child_level, .. }) if *child_level == level
        ) {
            let diag = self.diag(DiagCode::SignatureMismatch, node).with_arg(
                "detail",
                "record declarations contain only field declarations".to_string(),
            );
            self.diags.push(diag);
            return;
        }

        // Re-assignment to an existing binding, checked against its
        // declared type (refinement constraints included).
        let Some(symbol) = self.scopes.lookup(name) else {
            let text = self.interner.get(name).to_owned();
            let diag = self.diag(DiagCode::UnknownName, node).with_arg("name", text);
            self.diags.push(diag);
            return;
        };
        let ty = self.symbols.get(symbol).ty;
        let result = self.check_expr(value_node, ty);
        let Some(value) = result.inst else { return };
        self.insts.add(InstKind::Bind { symbol, value }, node, ty);
    }

    fn check_field_init(&mut self, node: NodeId, name: StringId, value_node: NodeId) {
        let ctx_ty = match self.blocks.last() {
            Some(BlockContext::RecordLiteral { ty, .. }
            | BlockContext::NestedRecordInit { ty, .. }) => *ty,
            _ => unreachable!("caller checked the top context"),
        };
        if ctx_ty == TY_INVALID {
            return;
        }
        let Some((index, field_ty)) = self.types.field(ctx_ty, name).map(|f| (f.index, f.ty))
        else {
            let text = self.interner.get(name).to_owned();
            let diag = self
                .diag(DiagCode::UnknownRecordField, node)
                .with_arg("record", self.type_name(ctx_ty))
                .with_arg("field", text);
            self.diags.push(diag);
            return;
        };
        let already = match self.blocks.last() {
            Some(BlockContext::RecordLiteral { inits, .. }
            | BlockContext::NestedRecordInit { inits, .. }) => inits[index as usize].is_some(),
            _ => unreachable!("caller checked the top context"),
        };
        if already {
            let text = self.interner.get(name).to_owned();
            let diag = self
                .diag(DiagCode::DuplicateField, node)
                .with_arg("field", text);
            self.diags.push(diag);
            return;
        }
        let result = self.check_expr(value_node, field_ty);
        self.set_top_init_slot(index, FieldValue::Inst(result.inst));
    }

    // ── Finalization ───────────────────────────────────────────────────

    fn finalize_block(&mut self, ctx: BlockContext) {
        match ctx {
            BlockContext::TypeDecl { name, node, fields, .. } => {
                let field_list: Vec<Field> = fields
                    .iter()
                    .enumerate()
                    .map(|(i, (field_name, ty, _))| Field {
                        name: *field_name,
                        ty: *ty,
                        index: i as u32,
                    })
                    .collect();
                if self.types.register_record(name, field_list).is_none() {
                    let text = self.interner.get(name).to_owned();
                    let diag = self
                        .diag(DiagCode::SignatureMismatch, node)
                        .with_arg("detail", format!("type `{text}` is already defined"));
                    self.diags.push(diag);
                }
            }
            BlockContext::RecordLiteral { base, node, ty, inits, .. } => {
                self.finalize_record(base, node, ty, &inits, true);
            }
            BlockContext::NestedRecordInit { path, node, ty, inits, .. } => {
                self.finalize_record(path, node, ty, &inits, false);
            }
        }
    }

    /// Validate that every field was provided, then create the flattened
    /// symbols and emit one `Bind` per expression-initialized field.
    /// Nested initializers created their leaf symbols when they closed.
    fn finalize_record(
        &mut self,
        base: StringId,
        node: NodeId,
        ty: TypeId,
        inits: &[Option<FieldValue>],
        create_base_symbol: bool,
    ) {
        if ty == TY_INVALID {
            return;
        }
        let fields = self.types.fields(ty).to_vec();
        let mut missing = false;
        for (field, slot) in fields.iter().zip(inits) {
            if slot.is_none() {
                missing = true;
                let text = self.interner.get(field.name).to_owned();
                let diag = self
                    .diag(DiagCode::MissingRecordField, node)
                    .with_arg("field", text)
                    .with_arg("record", self.type_name(ty));
                self.diags.push(diag);
            }
        }
        if missing {
            return;
        }

        if create_base_symbol {
            let symbol = self.symbols.add(base, node, ty);
            self.scopes.insert(base, symbol);
        }
        for (field, slot) in fields.iter().zip(inits) {
            match slot {
                Some(FieldValue::Inst(value)) => {
                    let text = self.interner.get(field.name).to_owned();
                    let flat = self.interner.concat(base, &text);
                    let symbol = self.symbols.add(flat, node, field.ty);
                    self.scopes.insert(flat, symbol);
                    if let Some(value) = value {
                        self.insts
                            .add(InstKind::Bind { symbol, value: *value }, node, field.ty);
                    }
                }
                Some(FieldValue::Nested) => {}
                None => unreachable!("missing fields returned above"),
            }
        }
    }

    // ── Type resolution ────────────────────────────────────────────────

    /// Resolve a type-syntax subtree to an interned `TypeId`, reporting
    /// and returning `invalid` on failure.
    pub(crate) fn resolve_type(&mut self, node: NodeId) -> TypeId {
        match self.node(node).kind {
            NodeKind::PrimType => match self.token_of(node).kind {
                TokenKind::KwI32 => TY_I32,
                TokenKind::KwI64 => TY_I64,
                TokenKind::KwF32 => TY_F32,
                TokenKind::KwF64 => TY_F64,
                other => unreachable!("token kind {other:?} is not a primitive type"),
            },
            NodeKind::NamedType => {
                let name = self.ident_of(node);
                match self.types.record_by_name(name) {
                    Some(ty) => ty,
                    None => {
                        let text = self.interner.get(name).to_owned();
                        let diag =
                            self.diag(DiagCode::UnknownName, node).with_arg("name", text);
                        self.diags.push(diag);
                        TY_INVALID
                    }
                }
            }
            NodeKind::ListType => {
                let elem = self.resolve_type(self.children(node)[0]);
                if elem == TY_INVALID {
                    return TY_INVALID;
                }
                let text = self.literal_text(node).to_owned();
                let size = match parse_int_literal(&text) {
                    Ok(v) if v > BigInt::from(0) && v <= BigInt::from(u32::MAX) => {
                        u32::try_from(&v).expect("range-checked size fits u32")
                    }
                    _ => {
                        let diag = self
                            .diag(DiagCode::NonPositiveListSize, node)
                            .with_arg("size", text);
                        self.diags.push(diag);
                        return TY_INVALID;
                    }
                };
                self.types.register_list(elem, size)
            }
            NodeKind::RefinedType => {
                let kids = self.children(node);
                let base = self.resolve_type(kids[0]);
                if base == TY_INVALID {
                    return TY_INVALID;
                }
                if base != TY_I32 && base != TY_I64 {
                    let diag = self
                        .diag(DiagCode::RefinementOnNonInteger, node)
                        .with_arg("type", self.type_name(base));
                    self.diags.push(diag);
                    return TY_INVALID;
                }
                let mut min = None;
                let mut max = None;
                for &bound in &kids[1..] {
                    let Some(value) = self.eval_bound(bound) else {
                        return TY_INVALID;
                    };
                    match self.node(bound).kind {
                        NodeKind::MinBound => min = Some(value),
                        NodeKind::MaxBound => max = Some(value),
                        other => unreachable!("node kind {other:?} is not a bound"),
                    }
                }
                self.types.register_refined(base, min, max)
            }
            NodeKind::FuncType => {
                let kids = self.children(node);
                let mut params = Vec::with_capacity(kids.len() - 1);
                for &param in &kids[..kids.len() - 1] {
                    let ty = self.resolve_type(param);
                    if ty == TY_INVALID {
                        return TY_INVALID;
                    }
                    params.push(ty);
                }
                let ret = self.resolve_type(kids[kids.len() - 1]);
                if ret == TY_INVALID {
                    return TY_INVALID;
                }
                self.types.register_func(params, ret)
            }
            other => unreachable!("node kind {other:?} is not a type"),
        }
    }

    /// Evaluate a `min=`/`max=` bound: an integer literal, optionally
    /// negated.
    fn eval_bound(&mut self, bound: NodeId) -> Option<BigInt> {
        let value_node = self.children(bound)[0];
        let (literal, negate) = match self.node(value_node).kind {
            NodeKind::IntLiteral => (value_node, false),
            NodeKind::UnaryExpr => (self.children(value_node)[0], true),
            other => unreachable!("node kind {other:?} is not a bound value"),
        };
        let text = self.literal_text(literal).to_owned();
        match parse_int_literal(&text) {
            Ok(value) => Some(if negate { -value } else { value }),
            Err(_) => {
                let diag = self
                    .diag(DiagCode::LiteralKindMismatch, literal)
                    .with_arg("expected", "an integer bound")
                    .with_arg("found", "a fractional literal");
                self.diags.push(diag);
                None
            }
        }
    }
}
