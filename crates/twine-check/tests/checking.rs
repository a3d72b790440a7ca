//! Checker coverage: literals and bounds, operators, functions, lists,
//! records, refinements, matches, and error propagation.

use twine_check::inst::{BinOp, InstKind};
use twine_check::ty::TY_I64;
use twine_check::{compile, Compilation};
use twine_common::ids::SymbolId;
use twine_lexer::IndentMode;

fn check_source(source: &str) -> Compilation {
    compile(source, IndentMode::Detect)
}

fn assert_clean(compilation: &Compilation) {
    assert!(
        !compilation.diags.has_errors(),
        "expected no errors, got {:?}",
        compilation.diags.codes()
    );
}

fn inst_kinds(compilation: &Compilation) -> Vec<InstKind> {
    compilation
        .result
        .insts
        .as_slice()
        .iter()
        .map(|i| i.kind)
        .collect()
}

fn symbol_names(compilation: &Compilation) -> Vec<String> {
    (0..compilation.result.symbols.count())
        .map(|i| {
            let symbol = compilation.result.symbols.get(SymbolId::new(i));
            compilation.interner.get(symbol.name).to_string()
        })
        .collect()
}

// ── Integer literals and bounds ────────────────────────────────────────

#[test]
fn i32_bounds_are_inclusive() {
    assert_clean(&check_source("a: i32 = 2147483647"));
    assert_clean(&check_source("a: i32 = -2147483648"));
    assert_eq!(
        check_source("a: i32 = 2147483648").diags.codes(),
        vec!["TWCHECK014"]
    );
    assert_eq!(
        check_source("a: i32 = -2147483649").diags.codes(),
        vec!["TWCHECK014"]
    );
}

#[test]
fn i64_bounds_are_inclusive() {
    assert_clean(&check_source("a: i64 = 9223372036854775807"));
    assert_clean(&check_source("a: i64 = -9223372036854775808"));
    assert_eq!(
        check_source("a: i64 = 9223372036854775808").diags.codes(),
        vec!["TWCHECK014"]
    );
}

#[test]
fn negative_literal_folds_into_the_constant() {
    let c = check_source("a: i32 = -1");
    assert_clean(&c);
    // The negation folded: a single sign-extended IntConst, no Negate.
    assert_eq!(
        inst_kinds(&c)[0],
        InstKind::IntConst { lo: 0xFFFF_FFFF, hi: 0xFFFF_FFFF }
    );
    assert!(!inst_kinds(&c).iter().any(|k| matches!(k, InstKind::Negate { .. })));
}

#[test]
fn int_exponents_evaluate_exactly() {
    let c = check_source("a: i32 = 1e3");
    assert_clean(&c);
    assert_eq!(inst_kinds(&c)[0], InstKind::IntConst { lo: 1000, hi: 0 });
}

#[test]
fn i64_constant_splits_into_halves() {
    let c = check_source("a: i64 = 4294967296"); // 2^32
    assert_clean(&c);
    assert_eq!(inst_kinds(&c)[0], InstKind::IntConst { lo: 0, hi: 1 });
}

#[test]
fn negative_exponent_is_not_an_integer() {
    assert_eq!(check_source("a: i32 = 1e-3").diags.codes(), vec!["TWCHECK016"]);
}

#[test]
fn literal_kind_mismatches() {
    // A plain integer literal in float position is a kind mismatch; a
    // float literal in integer position likewise.
    assert_eq!(check_source("a: f64 = 5").diags.codes(), vec!["TWCHECK016"]);
    assert_eq!(check_source("a: i32 = 1.5").diags.codes(), vec!["TWCHECK016"]);
    // Scientific notation is acceptable in float position.
    assert_clean(&check_source("a: f64 = 1e100"));
    assert_clean(&check_source("a: f32 = 1e10"));
}

#[test]
fn inference_defaults() {
    // Inferred int literals are i32: a call argument against an i64
    // parameter mismatches.
    let c = check_source("f: (i64) -> i64\nz: i64 = f(1)");
    assert_eq!(c.diags.codes(), vec!["TWCHECK016"]);
}

// ── Operators ──────────────────────────────────────────────────────────

#[test]
fn binary_operands_must_share_a_type() {
    let c = check_source("a: i64 = 5\nb: i32 = a + 1");
    assert_eq!(c.diags.codes(), vec!["TWCHECK022"]);
}

#[test]
fn same_typed_i64_arithmetic_checks() {
    let c = check_source("a: i64 = 5\nb: i64 = a + a");
    assert_clean(&c);
    let last = inst_kinds(&c);
    assert!(matches!(last[last.len() - 2], InstKind::BinaryOp { op: BinOp::Add, .. }));
    assert_eq!(c.result.insts.get(twine_common::ids::InstId::new(last.len() - 2)).ty, TY_I64);
}

#[test]
fn integer_only_operators_reject_floats() {
    let c = check_source("a: f64 = 1.5\nb: f64 = a % a");
    assert_eq!(c.diags.codes(), vec!["TWCHECK021"]);
    let c = check_source("a: f64 = 1.5\nb: f64 = a >> a");
    assert_eq!(c.diags.codes(), vec!["TWCHECK021"]);
}

#[test]
fn logical_operators_require_integers_and_produce_i32() {
    let c = check_source("a: i32 = 1\nb: i32 = a && a || a");
    assert_clean(&c);
    let kinds = inst_kinds(&c);
    assert!(kinds.iter().any(|k| matches!(k, InstKind::LogicalAnd { .. })));
    assert!(kinds.iter().any(|k| matches!(k, InstKind::LogicalOr { .. })));

    let c = check_source("a: f64 = 1.5\nb: i32 = a && a");
    assert_eq!(c.diags.codes(), vec!["TWCHECK024"]);
}

#[test]
fn comparisons_produce_i32() {
    let c = check_source("a: i64 = 5\nb: i32 = a < a");
    assert_clean(&c);
    // A comparison in non-i32 context is a type mismatch.
    let c = check_source("a: i64 = 5\nb: i64 = a < a");
    assert_eq!(c.diags.codes(), vec!["TWCHECK012"]);
}

#[test]
fn compare_chain_checks_all_operands_against_the_first() {
    let c = check_source("c: i32 = 1 < 2 <= 3");
    assert_clean(&c);
    let kinds = inst_kinds(&c);
    // One representative BinaryOp over the first operand pair.
    assert!(matches!(
        kinds[3],
        InstKind::BinaryOp { op: BinOp::Lt, .. }
    ));

    let c = check_source("f: f64 = 1.5\nc: i32 = 1 < 2 <= f");
    assert_eq!(c.diags.codes(), vec!["TWCHECK022"]);

    let c = check_source("c: i64 = 1 < 2 <= 3");
    assert_eq!(c.diags.codes(), vec!["TWCHECK012"]);
}

#[test]
fn bitwise_not_requires_integers() {
    let c = check_source("a: i32 = ~5");
    assert_clean(&c);
    assert!(inst_kinds(&c).iter().any(|k| matches!(k, InstKind::BitwiseNot { .. })));

    let c = check_source("a: f64 = ~1.5");
    assert_eq!(c.diags.codes(), vec!["TWCHECK021"]);
}

#[test]
fn negate_is_emitted_for_non_literals() {
    let c = check_source("a: i32 = 5\nb: i32 = -a");
    assert_clean(&c);
    assert!(inst_kinds(&c).iter().any(|k| matches!(k, InstKind::Negate { .. })));
}

// ── Names and scopes ───────────────────────────────────────────────────

#[test]
fn unknown_names_are_reported_once() {
    let c = check_source("a: i32 = missing");
    assert_eq!(c.diags.codes(), vec!["TWCHECK013"]);
}

#[test]
fn binding_type_mismatch() {
    let c = check_source("a: i32 = 1\nb: i64 = a");
    assert_eq!(c.diags.codes(), vec!["TWCHECK012"]);
}

#[test]
fn assignment_rechecks_the_declared_type() {
    let c = check_source("a: i32 = 1\na = 2");
    assert_clean(&c);
    let binds = inst_kinds(&c)
        .iter()
        .filter(|k| matches!(k, InstKind::Bind { .. }))
        .count();
    assert_eq!(binds, 2);

    let c = check_source("a = 2");
    assert_eq!(c.diags.codes(), vec!["TWCHECK013"]);
}

#[test]
fn function_parameters_do_not_escape_their_scope() {
    let c = check_source("f = (a: i32): i32 -> a\nb: i32 = a");
    assert_eq!(c.diags.codes(), vec!["TWCHECK013"]);
}

// ── Functions ──────────────────────────────────────────────────────────

#[test]
fn declaration_definition_and_call() {
    let c = check_source(
        "add: (i32, i32) -> i32\nadd = (a: i32, b: i32): i32 -> a + b\nz: i32 = add(1, 2)",
    );
    assert_clean(&c);

    let kinds = inst_kinds(&c);
    assert!(matches!(kinds[0], InstKind::FuncDecl { .. }));
    assert!(kinds.iter().any(|k| matches!(k, InstKind::FuncDef { .. })));
    assert!(kinds
        .iter()
        .any(|k| matches!(k, InstKind::Call { argc: 2, .. })));

    assert_eq!(c.result.funcs.count(), 1);
    let func = c.result.funcs.get(twine_common::ids::FuncId::new(0));
    assert!(func.defined);
    assert_eq!(func.params.len(), 2);
    let (start, end) = func.body.expect("definition captured a body range");
    // Body: VarRef a, VarRef b, BinaryOp.
    assert_eq!(end.index() - start.index(), 3);
}

#[test]
fn definition_must_match_declaration() {
    let c = check_source("add: (i32, i32) -> i32\nadd = (a: i32): i32 -> a");
    assert_eq!(c.diags.codes(), vec!["TWCHECK010"]);
}

#[test]
fn call_arity_and_argument_types() {
    let header = "add = (a: i32, b: i32): i32 -> a + b\n";
    let c = check_source(&format!("{header}z: i32 = add(1)"));
    assert_eq!(c.diags.codes(), vec!["TWCHECK010"]);

    let c = check_source(&format!("{header}z: i32 = add(1, 1.5)"));
    assert_eq!(c.diags.codes(), vec!["TWCHECK016"]);

    let c = check_source(&format!("{header}z: i64 = add(1, 2)"));
    assert_eq!(c.diags.codes(), vec!["TWCHECK012"]);
}

#[test]
fn calling_a_non_function_is_rejected() {
    let c = check_source("x: i32 = 1\ny: i32 = x(1)");
    assert_eq!(c.diags.codes(), vec!["TWCHECK016"]);
}

#[test]
fn function_redefinition_is_rejected() {
    let c = check_source("f = (): i32 -> 1\nf = (): i32 -> 2");
    assert_eq!(c.diags.codes(), vec!["TWCHECK010"]);
}

#[test]
fn body_type_must_match_the_return_annotation() {
    let c = check_source("f = (a: i32): i32 -> 1.5");
    assert_eq!(c.diags.codes(), vec!["TWCHECK016"]);
}

// ── Lists ──────────────────────────────────────────────────────────────

#[test]
fn list_bindings_flatten_into_element_symbols() {
    let c = check_source("xs: i32[3] = [1, 2, 3]\na: i32 = xs[1]");
    assert_clean(&c);

    let names = symbol_names(&c);
    for expected in ["xs", "xs_0", "xs_1", "xs_2", "a"] {
        assert!(names.contains(&expected.to_string()), "symbols: {names:?}");
    }

    // `xs[1]` resolved to a VarRef of `xs_1`.
    let var_ref = c
        .result
        .insts
        .as_slice()
        .iter()
        .rev()
        .find_map(|inst| match inst.kind {
            InstKind::VarRef { symbol } => Some(symbol),
            _ => None,
        })
        .expect("index access emits a VarRef");
    assert_eq!(c.interner.get(c.result.symbols.get(var_ref).name), "xs_1");
}

#[test]
fn list_index_bounds_are_checked_at_compile_time() {
    let c = check_source("xs: i32[3] = [1, 2, 3]\na: i32 = xs[3]");
    assert_eq!(c.diags.codes(), vec!["TWCHECK034"]);
}

#[test]
fn list_index_must_be_a_literal() {
    let c = check_source("xs: i32[3] = [1, 2, 3]\ni: i32 = 0\na: i32 = xs[i]");
    assert_eq!(c.diags.codes(), vec!["TWCHECK035"]);
}

#[test]
fn list_literal_size_must_match() {
    let c = check_source("xs: i32[2] = [1, 2, 3]");
    assert_eq!(c.diags.codes(), vec!["TWCHECK037"]);
    let c = check_source("xs: i32[4] = [1, 2, 3]");
    assert_eq!(c.diags.codes(), vec!["TWCHECK037"]);
}

#[test]
fn list_size_must_be_positive() {
    let c = check_source("xs: i32[0] = [1]");
    assert_eq!(c.diags.codes(), vec!["TWCHECK036"]);
}

#[test]
fn list_elements_are_checked_against_the_element_type() {
    let c = check_source("xs: i32[2] = [1, 1.5]");
    assert_eq!(c.diags.codes(), vec!["TWCHECK016"]);
}

// ── Records ────────────────────────────────────────────────────────────

const POINT: &str = "Point:\n\tx: i32\n\ty: i32\n";

#[test]
fn missing_record_field() {
    let c = check_source(&format!("{POINT}p: Point\n\tx = 1\nq: i32 = 0"));
    assert_eq!(c.diags.codes(), vec!["TWCHECK027"]);
}

#[test]
fn unknown_record_field() {
    let c = check_source(&format!("{POINT}p: Point\n\tx = 1\n\ty = 2\n\tz = 3\nq: i32 = 0"));
    assert_eq!(c.diags.codes(), vec!["TWCHECK028"]);
}

#[test]
fn duplicate_record_field_init() {
    let c = check_source(&format!("{POINT}p: Point\n\tx = 1\n\tx = 2\n\ty = 3\nq: i32 = 0"));
    assert_eq!(c.diags.codes(), vec!["TWCHECK029"]);
}

#[test]
fn duplicate_field_declaration() {
    let c = check_source("P:\n\tx: i32\n\tx: i64\nq: i32 = 0");
    assert_eq!(c.diags.codes(), vec!["TWCHECK029"]);
}

#[test]
fn duplicate_type_declaration() {
    let c = check_source("P:\n\tx: i32\nP:\n\ty: i32\nq: i32 = 0");
    assert_eq!(c.diags.codes(), vec!["TWCHECK010"]);
}

#[test]
fn field_access_on_non_record() {
    let c = check_source("a: i32 = 1\nb: i32 = a.x");
    assert_eq!(c.diags.codes(), vec!["TWCHECK031"]);
}

#[test]
fn no_such_field_on_record() {
    let c = check_source(&format!("{POINT}p: Point\n\tx = 1\n\ty = 2\nq: i32 = p.z"));
    assert_eq!(c.diags.codes(), vec!["TWCHECK030"]);
}

#[test]
fn nested_record_initializers_flatten_the_path() {
    let c = check_source(
        "Inner:\n\tval: i32\nOuter:\n\tinner: Inner\no: Outer\n\tinner: Inner\n\t\tval = 3\nv: i32 = o.inner.val",
    );
    assert_clean(&c);
    let names = symbol_names(&c);
    assert!(names.contains(&"o_inner_val".to_string()), "symbols: {names:?}");

    let var_ref = c
        .result
        .insts
        .as_slice()
        .iter()
        .rev()
        .find_map(|inst| match inst.kind {
            InstKind::VarRef { symbol } => Some(symbol),
            _ => None,
        })
        .expect("v's initializer emits a VarRef");
    assert_eq!(c.interner.get(c.result.symbols.get(var_ref).name), "o_inner_val");
}

#[test]
fn unknown_type_in_binding_does_not_cascade() {
    // `Ghost` is unknown; the init lines under it must not produce
    // secondary unknown-name errors.
    let c = check_source("p: Ghost\n\tx = 1\nq: i32 = 0");
    assert_eq!(c.diags.codes(), vec!["TWCHECK013"]);
}

#[test]
fn record_binding_requires_an_initializer_for_scalars() {
    let c = check_source("x: i32");
    assert_eq!(c.diags.codes(), vec!["TWCHECK010"]);
}

// ── Refinements ────────────────────────────────────────────────────────

#[test]
fn refinement_bounds_admit_in_range_constants() {
    let c = check_source("y: i32<min=0, max=100> = 100\ny = 0");
    assert_clean(&c);
}

#[test]
fn refinement_min_violation_cites_the_bound() {
    let c = check_source("y: i32<min=-5, max=5> = -6");
    assert_eq!(c.diags.codes(), vec!["TWCHECK041"]);
    let diag = &c.diags.all()[0];
    assert!(diag.args.contains(&("bound", "min".to_string())));
    assert!(diag.args.contains(&("limit", "-5".to_string())));
}

#[test]
fn refinement_requires_an_integer_base() {
    let c = check_source("y: f32<min=0> = 1.0");
    assert_eq!(c.diags.codes(), vec!["TWCHECK040"]);
}

#[test]
fn refined_types_intern_across_bindings() {
    let c = check_source("a: i32<min=0, max=9> = 1\nb: i32<min=0, max=9> = a");
    assert_clean(&c);
}

// ── Matches ────────────────────────────────────────────────────────────

#[test]
fn match_with_binding_arm_emits_pattern_bind() {
    let c = check_source("k: i32 = 1\nr: i32 = match k\n\t0 -> 10\n\tn -> n + 1");
    assert_clean(&c);
    let kinds = inst_kinds(&c);
    assert!(kinds.iter().any(|k| matches!(k, InstKind::PatternBind { .. })));
    let arms = kinds
        .iter()
        .filter(|k| matches!(k, InstKind::MatchArm { .. }))
        .count();
    assert_eq!(arms, 2);
    assert!(kinds.iter().any(|k| matches!(k, InstKind::Match { arms: 2, .. })));
    // The match result is bound to `r`.
    let names = symbol_names(&c);
    assert!(names.contains(&"r".to_string()));
}

#[test]
fn or_pattern_with_catch_all_is_exhaustive() {
    let c = check_source("k: i32 = 1\nr: i32 = match k\n\t0 -> 10\n\t2 | n -> 20");
    assert_clean(&c);
}

#[test]
fn literal_pattern_requires_an_integer_scrutinee() {
    let c = check_source("f: f64 = 1.5\nr: f64 = match f\n\t0 -> 1.0\n\t_ -> 2.0");
    assert_eq!(c.diags.codes(), vec!["TWCHECK018"]);
}

#[test]
fn arm_bodies_are_checked_against_the_binding_type() {
    let c = check_source("k: i32 = 1\nr: i32 = match k\n\t0 -> 1.5\n\t_ -> 2");
    assert_eq!(c.diags.codes(), vec!["TWCHECK016"]);
}

#[test]
fn match_arm_outside_a_match_is_rejected() {
    let c = check_source("0 -> 1");
    assert_eq!(c.diags.codes(), vec!["TWCHECK019"]);
}

#[test]
fn pattern_bindings_are_scoped_to_their_arm() {
    let c = check_source("k: i32 = 1\nr: i32 = match k\n\tn -> n\nq: i32 = n");
    assert_eq!(c.diags.codes(), vec!["TWCHECK013"]);
}

// ── Propagation ────────────────────────────────────────────────────────

#[test]
fn one_defect_one_diagnostic() {
    // The unknown name poisons the binding; the binary operation above it
    // must not add derived errors.
    let c = check_source("a: i32 = missing + 1");
    assert_eq!(c.diags.codes(), vec!["TWCHECK013"]);
}

#[test]
fn invalid_instructions_never_reach_the_stream() {
    let c = check_source("a: i32 = 1.5");
    assert!(c.diags.has_errors());
    for inst in c.result.insts.as_slice() {
        assert_ne!(inst.ty, twine_check::ty::TY_INVALID);
    }
}

#[test]
fn checking_continues_after_a_bad_statement() {
    let c = check_source("a: i32 = 1.5\nb: i32 = 2");
    assert_eq!(c.diags.codes(), vec!["TWCHECK016"]);
    assert!(inst_kinds(&c)
        .iter()
        .any(|k| matches!(k, InstKind::IntConst { lo: 2, hi: 0 })));
}
