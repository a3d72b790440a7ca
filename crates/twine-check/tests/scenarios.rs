//! End-to-end scenarios through the whole pipeline: tokenize, parse,
//! check, and inspect the emitted instruction stream and diagnostics.

use twine_check::inst::{BinOp, InstKind};
use twine_check::ty::TY_I32;
use twine_check::{compile, Compilation};
use twine_common::ids::SymbolId;
use twine_lexer::IndentMode;

fn check_source(source: &str) -> Compilation {
    compile(source, IndentMode::Detect)
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

#[test]
fn arithmetic_binding() {
    let c = check_source("x: i32 = 1 + 2");
    assert!(!c.diags.has_errors(), "got {:?}", c.diags.codes());

    let kinds = inst_kinds(&c);
    assert_eq!(kinds.len(), 4);
    assert_eq!(kinds[0], InstKind::IntConst { lo: 1, hi: 0 });
    assert_eq!(kinds[1], InstKind::IntConst { lo: 2, hi: 0 });
    assert!(matches!(kinds[2], InstKind::BinaryOp { op: BinOp::Add, .. }));
    assert!(matches!(kinds[3], InstKind::Bind { .. }));
    // Every emitted instruction is typed i32.
    for inst in c.result.insts.as_slice() {
        assert_eq!(inst.ty, TY_I32);
    }
}

#[test]
fn record_flattening() {
    let c = check_source(
        "Point:\n  x: i32\n  y: i32\np: Point\n  x = 1\n  y = 2\nq: i32 = p.x",
    );
    assert!(!c.diags.has_errors(), "got {:?}", c.diags.codes());

    let names = symbol_names(&c);
    assert!(names.contains(&"p_x".to_string()), "symbols: {names:?}");
    assert!(names.contains(&"p_y".to_string()), "symbols: {names:?}");

    // `q` resolves `p.x` to a VarRef of the flattened `p_x` symbol.
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
        .expect("q's initializer emits a VarRef");
    let referenced = c.result.symbols.get(var_ref);
    assert_eq!(c.interner.get(referenced.name), "p_x");
    assert_eq!(referenced.ty, TY_I32);

    // One Bind per flattened field plus one for q.
    let binds = inst_kinds(&c)
        .iter()
        .filter(|k| matches!(k, InstKind::Bind { .. }))
        .count();
    assert_eq!(binds, 3);
}

#[test]
fn match_exhaustiveness_failure() {
    let c = check_source("k: i32 = 0\nr: i32 = match k\n\t0 -> 10\n\t1 -> 20");
    assert_eq!(c.diags.codes(), vec!["TWCHECK020"]);

    // Arms were still processed: both bodies produced constants.
    let consts = inst_kinds(&c)
        .iter()
        .filter(|k| matches!(k, InstKind::IntConst { .. }))
        .count();
    assert_eq!(consts, 3, "k's initializer plus both arm bodies");
    // But no Match was emitted for the non-exhaustive expression.
    assert!(!inst_kinds(&c).iter().any(|k| matches!(k, InstKind::Match { .. })));
}

#[test]
fn f32_overflow() {
    let c = check_source("x: f32 = 1e100");
    assert_eq!(c.diags.codes(), vec!["TWCHECK017"]);

    let diag = &c.diags.all()[0];
    assert!(diag.args.contains(&("type", "f32".to_string())));
    assert!(diag.args.contains(&("value", "1e100".to_string())));

    // No float constant was emitted or pooled.
    assert!(!inst_kinds(&c).iter().any(|k| matches!(k, InstKind::FloatConst { .. })));
    assert_eq!(c.result.floats.count(), 0);
}

#[test]
fn refinement_violation() {
    let c = check_source("y: i32<min=0, max=100> = 5\ny = 150");
    assert_eq!(c.diags.codes(), vec!["TWCHECK041"]);

    let diag = &c.diags.all()[0];
    assert!(diag.args.contains(&("bound", "max".to_string())));
    assert!(diag.args.contains(&("limit", "100".to_string())));
    assert!(diag.args.contains(&("value", "150".to_string())));
    assert_eq!(diag.message(), "value 150 violates max=100");
}

#[test]
fn indent_discipline() {
    use twine_common::token::TokenKind;

    let c = check_source("panic\n\t\tpanic");
    assert_eq!(c.diags.codes(), vec!["TWLEX004"]);
    let diag = &c.diags.all()[0];
    assert_eq!((diag.line, diag.column), (2, 2));

    // The tokenizer still emits balanced dedents at EOF.
    let indents = c
        .tokens
        .as_slice()
        .iter()
        .filter(|t| matches!(t.kind, TokenKind::Indent(_)))
        .count();
    let dedents = c
        .tokens
        .as_slice()
        .iter()
        .filter(|t| matches!(t.kind, TokenKind::Dedent(_)))
        .count();
    assert_eq!(indents, 2);
    assert_eq!(dedents, 2);

    // Both panic statements were checked.
    let panics = inst_kinds(&c)
        .iter()
        .filter(|k| matches!(k, InstKind::Panic))
        .count();
    assert_eq!(panics, 2);
}
