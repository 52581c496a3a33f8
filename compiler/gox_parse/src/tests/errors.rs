use super::{parse, parse_expr_clean, parse_with};
use crate::Mode;
use gox_ir::Expr;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn broken_input_still_yields_a_tree() {
    let parsed = parse("package p\nfunc f( {\n");
    assert!(!parsed.errors.is_empty());
    assert_eq!(parsed.package_name(), "p");
    assert_eq!(parsed.file.decls.len(), 1);
}

#[test]
fn missing_package_clause_yields_placeholder() {
    let parsed = parse("123\n");
    assert!(!parsed.errors.is_empty());
    assert_eq!(parsed.package_name(), "_");
    assert!(parsed.file.decls.is_empty());
}

#[test]
fn errors_capped_at_ten() {
    let mut src = String::from("package p\n\nfunc f() {\n");
    for _ in 0..15 {
        src.push_str("\tgo 1\n");
    }
    src.push_str("}\n");

    let parsed = parse(&src);
    assert_eq!(parsed.errors.len(), 10);

    let parsed = parse_with(&src, Mode::ALL_ERRORS);
    assert_eq!(parsed.errors.len(), 15);
}

#[test]
fn one_error_per_line_by_default() {
    let src = "package p\n\nfunc f() { go 1; go 2 }\n";
    let parsed = parse(src);
    assert_eq!(parsed.errors.len(), 1);

    let parsed = parse_with(src, Mode::ALL_ERRORS);
    assert_eq!(parsed.errors.len(), 2);
}

#[test]
fn errors_come_back_sorted() {
    let parsed = parse_with(
        "package p\n\nfunc f() {\n\tgo 1\n\tgo 2\n\tgo 3\n}\n",
        Mode::ALL_ERRORS,
    );
    let lines: Vec<u32> = parsed.errors.iter().map(|e| e.pos.line).collect();
    let mut sorted = lines.clone();
    sorted.sort_unstable();
    assert_eq!(lines, sorted);
}

#[test]
fn invalid_import_paths_reported() {
    let parsed = parse("package p\n\nimport \"a b\"\n");
    assert_eq!(parsed.errors.len(), 1);
    let Some(err) = parsed.errors.first() else {
        panic!("expected an error");
    };
    assert_eq!(err.msg, "invalid import path: \"a b\"");

    let parsed = parse("package p\n\nimport \"\"\n");
    assert_eq!(parsed.errors.len(), 1);
}

#[test]
fn three_index_slice_requires_trailing_indices() {
    let Err(errors) = crate::parse_expr("xs[1:2:]") else {
        panic!("expected an error list");
    };
    let Some(err) = errors.first() else {
        panic!("expected an error");
    };
    assert_eq!(err.msg, "3rd index required in 3-index slice");
}

#[test]
fn expression_bail_out_carries_its_errors() {
    let mut src = String::from("f(");
    for _ in 0..12 {
        src.push_str("@,\n");
    }
    src.push(')');

    let Err(errors) = crate::parse_expr(&src) else {
        panic!("expected an error list");
    };
    assert!(errors.len() >= 10, "got {} errors", errors.len());
    assert!(errors.to_string() != "no errors");
}

#[test]
fn expression_must_consume_all_input() {
    assert!(crate::parse_expr("1 2").is_err());
    assert!(crate::parse_expr("x +").is_err());
}

#[test]
fn array_length_ellipsis_only_in_composite_literals() {
    parse_expr_clean("[...]int{1, 2}");
    let Err(errors) = crate::parse_expr("[...]int") else {
        panic!("expected an error list");
    };
    let Some(err) = errors.first() else {
        panic!("expected an error");
    };
    assert_eq!(err.msg, "expected array length, found '...'");
}

proptest! {
    #[test]
    fn identifiers_parse_as_expressions(name in "[a-z][a-z0-9_]{0,8}") {
        prop_assume!(gox_ir::Token::lookup(&name) == gox_ir::Token::Ident);
        let parsed = parse_expr_clean(&name);
        let Expr::Ident { name: n, .. } = parsed.arena.expr(parsed.expr) else {
            panic!("expected identifier");
        };
        prop_assert_eq!(parsed.interner.lookup(*n), name.as_str());
    }

    #[test]
    fn integer_literals_parse_as_expressions(n in any::<u32>()) {
        let parsed = parse_expr_clean(&n.to_string());
        let Expr::BasicLit { kind, .. } = parsed.arena.expr(parsed.expr) else {
            panic!("expected literal");
        };
        prop_assert_eq!(*kind, gox_ir::Token::Int);
    }
}
