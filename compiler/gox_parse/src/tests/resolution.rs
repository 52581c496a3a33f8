use super::{parse, parse_clean, parse_with};
use crate::Mode;
use gox_ir::Expr;
use pretty_assertions::assert_eq;

fn unresolved_names(parsed: &crate::ParsedFile) -> Vec<String> {
    parsed
        .file
        .unresolved
        .iter()
        .map(|&id| match parsed.arena.expr(id) {
            Expr::Ident { name, .. } => parsed.interner.lookup(*name).to_owned(),
            other => panic!("non-identifier in unresolved list: {other:?}"),
        })
        .collect()
}

#[test]
fn forward_reference_resolves_against_package_scope() {
    let parsed = parse_clean(
        "package p\n\
         \n\
         func a() { b() }\n\
         func b() {}\n",
    );
    assert_eq!(unresolved_names(&parsed), Vec::<String>::new());
}

#[test]
fn free_names_stay_unresolved() {
    let parsed = parse_clean(
        "package p\n\
         \n\
         func a() { c() }\n",
    );
    assert_eq!(unresolved_names(&parsed), vec!["c".to_owned()]);
}

#[test]
fn imports_are_not_declared() {
    // Import names resolve in a later phase; the parser only records
    // the file-level uses.
    let parsed = parse_clean(
        "package p\n\
         \n\
         import \"fmt\"\n\
         \n\
         func f() { fmt.Println() }\n",
    );
    assert_eq!(unresolved_names(&parsed), vec!["fmt".to_owned()]);
}

#[test]
fn redeclaration_reported_with_mode() {
    let parsed = parse_with(
        "package p\n\nvar a = 1\nvar a = 2\n",
        Mode::DECLARATION_ERRORS,
    );
    assert_eq!(parsed.errors.len(), 1);
    let Some(err) = parsed.errors.first() else {
        panic!("expected an error");
    };
    assert!(
        err.msg.starts_with("a redeclared in this block"),
        "unexpected message: {}",
        err.msg
    );
    assert!(err.msg.contains("previous declaration at"), "{}", err.msg);
}

#[test]
fn redeclaration_silent_by_default() {
    let parsed = parse("package p\n\nvar a = 1\nvar a = 2\n");
    assert!(parsed.errors.is_empty(), "{}", parsed.errors);
}

#[test]
fn short_var_decl_requires_new_variable() {
    let parsed = parse_with(
        "package p\n\nfunc f() {\n\ta := 1\n\ta := 2\n\t_ = a\n}\n",
        Mode::DECLARATION_ERRORS,
    );
    assert_eq!(parsed.errors.len(), 1);
    let Some(err) = parsed.errors.first() else {
        panic!("expected an error");
    };
    assert_eq!(err.msg, "no new variables on left side of :=");
}

#[test]
fn short_var_decl_may_reuse_some_variables() {
    let parsed = parse_with(
        "package p\n\nfunc f() {\n\ta := 1\n\ta, b := 2, 3\n\t_, _ = a, b\n}\n",
        Mode::DECLARATION_ERRORS,
    );
    assert!(parsed.errors.is_empty(), "{}", parsed.errors);
}

#[test]
fn defined_label_resolves() {
    let parsed = parse_with(
        "package p\n\
         \n\
         func f() {\n\
         L:\n\
         \tfor {\n\
         \t\tbreak L\n\
         \t}\n\
         }\n",
        Mode::DECLARATION_ERRORS,
    );
    assert!(parsed.errors.is_empty(), "{}", parsed.errors);
}

#[test]
fn undefined_label_reported() {
    let parsed = parse_with(
        "package p\n\nfunc f() { goto L }\n",
        Mode::DECLARATION_ERRORS,
    );
    assert_eq!(parsed.errors.len(), 1);
    let Some(err) = parsed.errors.first() else {
        panic!("expected an error");
    };
    assert_eq!(err.msg, "label L undefined");
}

#[test]
fn blank_package_name_rejected() {
    let parsed = parse_with("package _\n", Mode::DECLARATION_ERRORS);
    assert_eq!(parsed.errors.len(), 1);
    let Some(err) = parsed.errors.first() else {
        panic!("expected an error");
    };
    assert_eq!(err.msg, "invalid package name _");
}

#[test]
fn const_entities_record_group_index() {
    let parsed = parse_clean(
        "package p\n\
         \n\
         const (\n\
         \ta = iota\n\
         \tb\n\
         \tc\n\
         )\n",
    );
    let name = parsed.interner.intern("c");
    let Some(entity) = parsed.arena.scope(parsed.file.scope).lookup(name) else {
        panic!("c not declared in the file scope");
    };
    assert_eq!(parsed.arena.entity(entity).data, Some(2));
}
