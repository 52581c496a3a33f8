//! Recursive descent parser for Gox source files.
//!
//! Produces a flat AST in an [`Arena`], together with per-file scope
//! and resolution information. Parsing is tolerant: syntax errors are
//! collected in an [`ErrorList`] and the parser recovers and keeps
//! going, so a tree (possibly containing `Bad` nodes) comes back even
//! for broken input.

mod parser;
mod recovery;

mod grammar;

#[cfg(test)]
mod tests;

use parser::Parser;

use gox_diagnostic::ErrorList;
use gox_ir::{Arena, ExprId, FileNode, FileSet, Position, StringInterner, Token};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

bitflags::bitflags! {
    /// Parser configuration.
    #[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
    pub struct Mode: u8 {
        /// Stop after the package clause.
        const PACKAGE_CLAUSE_ONLY = 1 << 0;
        /// Stop after the import declarations.
        const IMPORTS_ONLY = 1 << 1;
        /// Attach comment groups to the tree.
        const PARSE_COMMENTS = 1 << 2;
        /// Emit a `tracing` event per production entered.
        const TRACE = 1 << 3;
        /// Report declaration errors (redeclarations, undefined
        /// labels).
        const DECLARATION_ERRORS = 1 << 4;
        /// Report all errors, instead of at most one per line with a
        /// cap of ten per file.
        const ALL_ERRORS = 1 << 5;
    }
}

/// A parsed source file: the syntax tree plus the arena and interner
/// its nodes live in, and whatever errors the parse collected.
#[derive(Debug)]
pub struct ParsedFile {
    pub arena: Arena,
    pub interner: StringInterner,
    pub file: FileNode,
    /// Sorted by position. Empty on a clean parse.
    pub errors: ErrorList,
}

impl ParsedFile {
    /// The declared package name.
    pub fn package_name(&self) -> &str {
        match self.arena.expr(self.file.name) {
            gox_ir::Expr::Ident { name, .. } => self.interner.lookup(*name),
            _ => "",
        }
    }
}

/// The files of one package within a directory, keyed by file path.
#[derive(Debug, Default)]
pub struct Package {
    pub name: String,
    pub files: BTreeMap<String, ParsedFile>,
}

/// A parsed standalone expression.
#[derive(Debug)]
pub struct ParsedExpr {
    pub arena: Arena,
    pub interner: StringInterner,
    pub expr: ExprId,
}

fn take_errors(errors: Rc<RefCell<ErrorList>>) -> ErrorList {
    match Rc::try_unwrap(errors) {
        Ok(cell) => cell.into_inner(),
        Err(rc) => rc.borrow().clone(),
    }
}

/// Parse a single source file.
///
/// A tree always comes back: on errors it contains `Bad` nodes, and if
/// the input does not even have a usable package clause the tree is a
/// minimal placeholder. The errors travel in [`ParsedFile::errors`],
/// sorted by position.
pub fn parse_file(
    fset: &FileSet,
    filename: &str,
    src: impl AsRef<[u8]>,
    mode: Mode,
) -> ParsedFile {
    let src = src.as_ref();
    let file = fset.add_file(filename, None, src.len() as u32);
    let errors = Rc::new(RefCell::new(ErrorList::new()));
    let mut parser = Parser::new(file, src, Rc::clone(&errors), mode);

    let node = match parser.parse_file() {
        Ok(Some(node)) => node,
        // Not a source file, or the error cap was hit; deliver
        // whatever was parsed before that.
        Ok(None) | Err(_) => parser.assemble_file(),
    };

    let Parser {
        arena, interner, ..
    } = parser;
    let mut errors = take_errors(errors);
    errors.sort();
    ParsedFile {
        arena,
        interner,
        file: node,
        errors,
    }
}

/// Parse every file of `dir` for which `filter` returns true (plain
/// files named `*.gox` are considered; the filter sees the file name).
/// Files are parsed in parallel and grouped by declared package name.
///
/// I/O failures surface as an `Err` list; syntax errors stay attached
/// to their [`ParsedFile`].
pub fn parse_dir(
    fset: &FileSet,
    dir: impl AsRef<Path>,
    filter: impl Fn(&str) -> bool + Sync,
    mode: Mode,
) -> Result<BTreeMap<String, Package>, ErrorList> {
    use rayon::prelude::*;

    let dir = dir.as_ref();
    let io_error = |err: std::io::Error| {
        let mut list = ErrorList::new();
        list.add(
            Position {
                filename: dir.display().to_string(),
                ..Position::default()
            },
            err.to_string(),
        );
        list
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();
        let is_source = path.extension().is_some_and(|ext| ext == "gox");
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if is_source && path.is_file() && filter(name) {
            paths.push(path);
        }
    }
    paths.sort();

    let parsed: Vec<Result<(String, ParsedFile), ErrorList>> = paths
        .par_iter()
        .map(|path| {
            let src = std::fs::read(path).map_err(|err| {
                let mut list = ErrorList::new();
                list.add(
                    Position {
                        filename: path.display().to_string(),
                        ..Position::default()
                    },
                    err.to_string(),
                );
                list
            })?;
            let filename = path.display().to_string();
            Ok((filename.clone(), parse_file(fset, &filename, &src, mode)))
        })
        .collect();

    let mut packages: BTreeMap<String, Package> = BTreeMap::new();
    for result in parsed {
        let (filename, file) = result?;
        let name = file.package_name().to_owned();
        let pkg = packages.entry(name.clone()).or_default();
        pkg.name = name;
        pkg.files.insert(filename, file);
    }
    Ok(packages)
}

/// Parse a standalone expression, as used by tooling and tests.
pub fn parse_expr(src: &str) -> Result<ParsedExpr, ErrorList> {
    let fset = FileSet::new();
    let file = fset.add_file("", None, src.len() as u32);
    let errors = Rc::new(RefCell::new(ErrorList::new()));
    let mut parser = Parser::new(file, src.as_bytes(), Rc::clone(&errors), Mode::empty());

    // Synthetic scopes so resolution has somewhere to look.
    let expr = parser.parse_standalone_expr();

    let Parser {
        arena, interner, ..
    } = parser;
    let mut errors = take_errors(errors);
    errors.sort();
    match expr {
        Ok(expr) if errors.is_empty() => Ok(ParsedExpr {
            arena,
            interner,
            expr,
        }),
        _ => {
            // A bail-out records its errors before unwinding, so the
            // list is non-empty whenever the expression is missing.
            debug_assert!(!errors.is_empty());
            Err(errors)
        }
    }
}

impl Parser<'_> {
    fn parse_standalone_expr(&mut self) -> parser::PResult<ExprId> {
        self.open_scope();
        self.pkg_scope = self.top_scope;
        let expr = self.parse_rhs_or_type()?;
        self.close_scope();
        // Consume an inserted terminating semicolon, then require the
        // input to end.
        if self.tok == Token::Semicolon && self.lit == "\n" {
            self.next();
        }
        self.expect(Token::Eof)?;
        Ok(expr)
    }
}
