//! Parser tests.
//!
//! - `parser`: syntactic coverage of declarations, statements, and
//!   expressions on well-formed input.
//! - `resolution`: scopes, redeclaration, labels, and the unresolved
//!   list.
//! - `errors`: tolerance on broken input, the per-line discard, and
//!   the error cap.

mod errors;
mod resolution;

use crate::{parse_file, Mode, ParsedFile};
use gox_ir::FileSet;

fn parse(src: &str) -> ParsedFile {
    parse_with(src, Mode::empty())
}

fn parse_with(src: &str, mode: Mode) -> ParsedFile {
    let fset = FileSet::new();
    parse_file(&fset, "test.gox", src, mode)
}

fn parse_expr_clean(src: &str) -> crate::ParsedExpr {
    match crate::parse_expr(src) {
        Ok(parsed) => parsed,
        Err(errors) => panic!("unexpected expression errors: {errors}"),
    }
}

/// Parse expecting success; panics with the error list otherwise.
fn parse_clean(src: &str) -> ParsedFile {
    let parsed = parse(src);
    assert!(
        parsed.errors.is_empty(),
        "unexpected parse errors: {}",
        parsed.errors
    );
    parsed
}
