//! Parser state and the helpers shared by all grammar productions.
//!
//! The grammar itself lives in [`crate::grammar`]; this module owns
//! token advancement, comment association, error reporting with the
//! bail-out cap, recovery synchronization, and the scope machinery for
//! identifier and label resolution.

use crate::recovery::{TokenSet, STMT_START};
use crate::Mode;
use gox_diagnostic::ErrorList;
use gox_ir::{
    Arena, Comment, CommentGroup, CommentId, DeclId, DeclRef, Entity, EntityId, EntityKind, Expr,
    ExprId, File, Name, Pos, ScopeData, ScopeId, SpecId, StringInterner, Token,
};
use gox_scan::{error_list_handler, Scanner};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Marker for an abandoned parse: the error cap was reached and the
/// parser unwound to the entry point. Not an error value by itself; the
/// accumulated [`ErrorList`] carries the diagnostics.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Bailout;

pub(crate) type PResult<T> = Result<T, Bailout>;

/// Maximum number of errors before the parser gives up on the file.
const MAX_ERRORS: usize = 10;

pub(crate) struct Parser<'a> {
    pub(crate) file: Arc<File>,
    pub(crate) errors: Rc<RefCell<ErrorList>>,
    scanner: Scanner<'a>,
    pub(crate) mode: Mode,
    trace: bool,
    indent: usize,

    pub(crate) arena: Arena,
    pub(crate) interner: StringInterner,
    blank: Name,

    /// All comment groups seen so far, in source order.
    pub(crate) comments: Vec<CommentId>,
    /// Comment group immediately preceding the current token, with no
    /// blank line in between.
    pub(crate) lead_comment: Option<CommentId>,
    /// Comment group on the same line as the previous token.
    pub(crate) line_comment: Option<CommentId>,

    /// Current token.
    pub(crate) pos: Pos,
    pub(crate) tok: Token,
    pub(crate) lit: String,

    /// Last synchronization position and the number of times the parser
    /// has resynchronized there; guards against recovery livelock.
    sync_pos: Pos,
    sync_cnt: usize,

    /// Composite-literal nesting: `{` at `expr_lev < 0` opens a block,
    /// not a literal.
    pub(crate) expr_lev: i32,
    /// Set while parsing the right-hand side of an assignment.
    pub(crate) in_rhs: bool,

    /// Innermost ordinary-identifier scope.
    pub(crate) top_scope: Option<ScopeId>,
    /// File scope, holding this file's package-level declarations.
    pub(crate) pkg_scope: Option<ScopeId>,
    /// Identifiers that did not resolve to any open scope.
    pub(crate) unresolved: Vec<ExprId>,
    pub(crate) imports: Vec<SpecId>,
    /// Top-level declarations parsed so far; lives here so a bail-out
    /// still yields the partial file.
    pub(crate) decls: Vec<DeclId>,
    /// Package clause, once parsed; also needed for partial files.
    pub(crate) file_doc: Option<CommentId>,
    pub(crate) package_pos: Pos,
    pub(crate) package_name: Option<ExprId>,

    /// Innermost label scope (one per function).
    pub(crate) label_scope: Option<ScopeId>,
    /// One entry per open label scope: the `goto`/`break`/`continue`
    /// targets to resolve when the scope closes.
    pub(crate) target_stack: Vec<Vec<ExprId>>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        file: Arc<File>,
        src: &'a [u8],
        errors: Rc<RefCell<ErrorList>>,
        mode: Mode,
    ) -> Parser<'a> {
        let scan_mode = if mode.contains(Mode::PARSE_COMMENTS) {
            gox_scan::Mode::SCAN_COMMENTS
        } else {
            gox_scan::Mode::empty()
        };
        let scanner = Scanner::new(
            Arc::clone(&file),
            src,
            Some(error_list_handler(Rc::clone(&errors))),
            scan_mode,
        );
        let interner = StringInterner::new();
        let blank = interner.intern("_");

        let mut parser = Parser {
            file,
            errors,
            scanner,
            mode,
            trace: mode.contains(Mode::TRACE),
            indent: 0,
            arena: Arena::with_capacity(src.len()),
            interner,
            blank,
            comments: Vec::new(),
            lead_comment: None,
            line_comment: None,
            pos: Pos::NONE,
            tok: Token::Illegal,
            lit: String::new(),
            sync_pos: Pos::NONE,
            sync_cnt: 0,
            expr_lev: 0,
            in_rhs: false,
            top_scope: None,
            pkg_scope: None,
            unresolved: Vec::new(),
            imports: Vec::new(),
            decls: Vec::new(),
            file_doc: None,
            package_pos: Pos::NONE,
            package_name: None,
            label_scope: None,
            target_stack: Vec::new(),
        };
        parser.next();
        parser
    }

    pub(crate) fn is_blank(&self, name: Name) -> bool {
        name == self.blank
    }

    // === Tracing ===

    pub(crate) fn trace_enter(&mut self, production: &str) {
        if self.trace {
            tracing::trace!(
                "{:width$}{production} at {}",
                "",
                self.file.position(self.pos),
                width = self.indent * 2
            );
            self.indent += 1;
        }
    }

    pub(crate) fn trace_leave(&mut self) {
        if self.trace {
            self.indent = self.indent.saturating_sub(1);
        }
    }

    // === Token advancement and comment association ===

    fn next0(&mut self) {
        let (pos, tok, lit) = self.scanner.scan();
        self.pos = pos;
        self.tok = tok;
        self.lit = lit;
    }

    /// Consume one comment token; returns the group-relative end line.
    fn consume_comment(&mut self) -> (Comment, u32) {
        let mut endline = self.file.line(self.pos);
        if self.lit.as_bytes().get(1) == Some(&b'*') {
            endline += self.lit.bytes().filter(|&b| b == b'\n').count() as u32;
        }
        let comment = Comment {
            slash: self.pos,
            text: std::mem::take(&mut self.lit),
        };
        self.next0();
        (comment, endline)
    }

    /// Consume a run of comments where each comment starts at most `n`
    /// lines after the previous one ended.
    fn consume_comment_group(&mut self, n: u32) -> (CommentId, u32) {
        let mut list = Vec::new();
        let mut endline = self.file.line(self.pos);
        while self.tok == Token::Comment && self.file.line(self.pos) <= endline + n {
            let (comment, end) = self.consume_comment();
            endline = end;
            list.push(comment);
        }
        let id = self.arena.alloc_comment(CommentGroup { list });
        self.comments.push(id);
        (id, endline)
    }

    /// Advance to the next non-comment token, tracking which comment
    /// groups document the surrounding tokens.
    pub(crate) fn next(&mut self) {
        self.lead_comment = None;
        self.line_comment = None;
        let prev = self.pos;
        self.next0();

        if self.tok == Token::Comment {
            if self.file.line(self.pos) == self.file.line(prev) {
                // Comment on the same line as the previous token.
                let (group, endline) = self.consume_comment_group(0);
                if self.file.line(self.pos) != endline {
                    // Next token is on a different line, so the group
                    // trails the previous token.
                    self.line_comment = Some(group);
                }
            }

            let mut lead = None;
            let mut endline = 0;
            while self.tok == Token::Comment {
                let (group, end) = self.consume_comment_group(1);
                lead = Some(group);
                endline = end;
            }
            if let Some(group) = lead {
                if endline + 1 == self.file.line(self.pos) {
                    // No blank line between group and token.
                    self.lead_comment = Some(group);
                }
            }
        }
    }

    // === Errors ===

    /// Record an error. Unless `Mode::ALL_ERRORS` is set, errors on the
    /// same line as the previous error are discarded as likely
    /// consequences of it, and once [`MAX_ERRORS`] errors accumulate
    /// the parse bails out.
    pub(crate) fn error(&mut self, pos: Pos, msg: impl Into<String>) -> PResult<()> {
        let epos = self.file.position(pos);
        if !self.mode.contains(Mode::ALL_ERRORS) {
            let errors = self.errors.borrow();
            if errors
                .iter()
                .last()
                .is_some_and(|e| e.pos.filename == epos.filename && e.pos.line == epos.line)
            {
                // Discard: likely a consequence of the previous error.
                return Ok(());
            }
            if errors.len() >= MAX_ERRORS {
                return Err(Bailout);
            }
        }
        self.errors.borrow_mut().add(epos, msg);
        Ok(())
    }

    pub(crate) fn error_expected(&mut self, pos: Pos, what: &str) -> PResult<()> {
        let mut msg = format!("expected {what}");
        if pos == self.pos {
            // Error at the current token: say what was found instead.
            if self.tok == Token::Semicolon && self.lit == "\n" {
                msg.push_str(", found newline");
            } else if self.tok.is_literal() {
                msg.push_str(", found ");
                msg.push_str(&self.lit);
            } else {
                msg.push_str(&format!(", found '{}'", self.tok));
            }
        }
        self.error(pos, msg)
    }

    pub(crate) fn expect(&mut self, tok: Token) -> PResult<Pos> {
        let pos = self.pos;
        if self.tok != tok {
            self.error_expected(pos, &format!("'{tok}'"))?;
        }
        self.next();
        Ok(pos)
    }

    /// Like [`expect`](Self::expect), but with a friendlier message for
    /// list contexts where a newline stands in for the closing token.
    pub(crate) fn expect_closing(&mut self, tok: Token, context: &str) -> PResult<Pos> {
        if self.tok != tok && self.tok == Token::Semicolon && self.lit == "\n" {
            self.error(self.pos, format!("missing ',' before newline in {context}"))?;
            self.next();
        }
        self.expect(tok)
    }

    /// Expect a terminating semicolon; it may be elided before `)` or
    /// `}`.
    pub(crate) fn expect_semi(&mut self) -> PResult<()> {
        if self.tok != Token::Rparen && self.tok != Token::Rbrace {
            match self.tok {
                Token::Comma => {
                    // A comma usually means a half-edited list.
                    self.error_expected(self.pos, "';'")?;
                    self.next();
                }
                Token::Semicolon => self.next(),
                _ => {
                    self.error_expected(self.pos, "';'")?;
                    self.sync(STMT_START);
                }
            }
        }
        Ok(())
    }

    /// `true` if the current token acts as a comma in `context`
    /// (reporting an inserted semicolon that stands where a comma
    /// should be).
    pub(crate) fn at_comma(&mut self, context: &str) -> PResult<bool> {
        if self.tok == Token::Comma {
            return Ok(true);
        }
        if self.tok == Token::Semicolon && self.lit == "\n" {
            self.error(self.pos, format!("missing ',' before newline in {context}"))?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Skip tokens until one in `to` (or EOF). Ensures progress: after
    /// ten stalls at the same position the next matching token is
    /// consumed rather than returned to.
    pub(crate) fn sync(&mut self, to: TokenSet) {
        while self.tok != Token::Eof {
            if to.contains(self.tok) {
                if self.pos == self.sync_pos && self.sync_cnt < 10 {
                    self.sync_cnt += 1;
                    return;
                }
                if self.pos > self.sync_pos {
                    self.sync_pos = self.pos;
                    self.sync_cnt = 0;
                    return;
                }
            }
            self.next();
        }
    }

    /// Clamp `pos` into the file, for closing positions of nodes whose
    /// delimiter was never found.
    pub(crate) fn safe_pos(&self, pos: Pos) -> Pos {
        let base = self.file.base();
        let end = base + self.file.size();
        if (base..=end).contains(&pos.0) {
            pos
        } else {
            Pos(end)
        }
    }

    // === Scopes, declaration, resolution ===

    pub(crate) fn open_scope(&mut self) {
        self.top_scope = Some(self.arena.alloc_scope(ScopeData::new(self.top_scope)));
    }

    pub(crate) fn close_scope(&mut self) {
        let scope = self.top_scope.unwrap_or_else(|| unreachable!("unbalanced scopes"));
        self.top_scope = self.arena.scope(scope).outer;
    }

    pub(crate) fn open_label_scope(&mut self) {
        self.label_scope = Some(self.arena.alloc_scope(ScopeData::new(self.label_scope)));
        self.target_stack.push(Vec::new());
    }

    /// Close the innermost label scope, resolving the branch targets
    /// collected in it.
    pub(crate) fn close_label_scope(&mut self) -> PResult<()> {
        let scope = self
            .label_scope
            .unwrap_or_else(|| unreachable!("unbalanced label scopes"));
        let targets = self
            .target_stack
            .pop()
            .unwrap_or_else(|| unreachable!("unbalanced label scopes"));
        for ident in targets {
            let (pos, name) = match self.arena.expr(ident) {
                Expr::Ident { pos, name, .. } => (*pos, *name),
                _ => continue,
            };
            let entity = self.arena.scope(scope).lookup(name);
            if let Expr::Ident { entity: slot, .. } = self.arena.expr_mut(ident) {
                *slot = entity;
            }
            if entity.is_none() && self.mode.contains(Mode::DECLARATION_ERRORS) {
                let text = self.interner.lookup(name);
                self.error(pos, format!("label {text} undefined"))?;
            }
        }
        self.label_scope = self.arena.scope(scope).outer;
        Ok(())
    }

    /// Best-effort source position of an entity's declaring identifier.
    fn entity_pos(&self, id: EntityId) -> Pos {
        let entity = self.arena.entity(id);
        let ident_pos = |exprs: &[ExprId]| {
            exprs
                .iter()
                .find_map(|&x| match self.arena.expr(x) {
                    Expr::Ident { pos, name, .. } if *name == entity.name => Some(*pos),
                    _ => None,
                })
        };
        match entity.decl {
            Some(DeclRef::Field(f)) => ident_pos(&self.arena.field(f).names).unwrap_or(Pos::NONE),
            Some(DeclRef::Spec(s)) => match self.arena.spec(s) {
                gox_ir::Spec::Import { name, path, .. } => name
                    .and_then(|n| ident_pos(&[n]))
                    .unwrap_or_else(|| self.arena.expr_pos(*path)),
                gox_ir::Spec::Value { names, .. } => ident_pos(names).unwrap_or(Pos::NONE),
                gox_ir::Spec::Type { name, .. } => ident_pos(&[*name]).unwrap_or(Pos::NONE),
            },
            Some(DeclRef::Decl(d)) => match self.arena.decl(d) {
                gox_ir::Decl::Func { name, .. } => ident_pos(&[*name]).unwrap_or(Pos::NONE),
                _ => Pos::NONE,
            },
            Some(DeclRef::Stmt(s)) => match self.arena.stmt(s) {
                gox_ir::Stmt::Assign { lhs, .. } => ident_pos(lhs).unwrap_or(Pos::NONE),
                gox_ir::Stmt::Labeled { label, .. } => ident_pos(&[*label]).unwrap_or(Pos::NONE),
                _ => Pos::NONE,
            },
            _ => Pos::NONE,
        }
    }

    /// Declare each identifier in `idents` in `scope`, reporting
    /// redeclarations when declaration errors are enabled. The blank
    /// identifier is never entered into a scope.
    pub(crate) fn declare(
        &mut self,
        decl: DeclRef,
        data: Option<u32>,
        scope: ScopeId,
        kind: EntityKind,
        idents: &[ExprId],
    ) -> PResult<()> {
        for &ident in idents {
            let (pos, name) = match self.arena.expr(ident) {
                Expr::Ident { pos, name, entity } => {
                    debug_assert!(entity.is_none(), "identifier already declared or resolved");
                    (*pos, *name)
                }
                _ => continue,
            };
            let mut entity = Entity::new(kind, name);
            entity.decl = Some(decl);
            entity.data = data;
            let id = self.arena.alloc_entity(entity);
            if let Expr::Ident { entity: slot, .. } = self.arena.expr_mut(ident) {
                *slot = Some(id);
            }
            if self.is_blank(name) {
                continue;
            }
            if let Some(prev) = self.arena.scope_mut(scope).insert(name, id) {
                if self.mode.contains(Mode::DECLARATION_ERRORS) {
                    let text = self.interner.lookup(name);
                    let prev_pos = self.entity_pos(prev);
                    let detail = if prev_pos.is_valid() {
                        format!(
                            "\n\tprevious declaration at {}",
                            self.file.position(prev_pos)
                        )
                    } else {
                        String::new()
                    };
                    self.error(pos, format!("{text} redeclared in this block{detail}"))?;
                }
            }
        }
        Ok(())
    }

    /// Declare the left-hand side of `:=`. Existing variables of the
    /// enclosing block may be re-used, but at least one non-blank
    /// variable must be new.
    pub(crate) fn short_var_decl(&mut self, decl: DeclRef, list: &[ExprId]) -> PResult<()> {
        let scope = self
            .top_scope
            .unwrap_or_else(|| unreachable!("short variable declaration outside any scope"));
        let mut new_vars = 0;
        for &x in list {
            let (pos, name, is_ident) = match self.arena.expr(x) {
                Expr::Ident { pos, name, .. } => (*pos, *name, true),
                _ => (self.arena.expr_pos(x), Name::EMPTY, false),
            };
            if !is_ident {
                self.error_expected(pos, "identifier on left side of :=")?;
                continue;
            }
            let mut entity = Entity::new(EntityKind::Var, name);
            entity.decl = Some(decl);
            let id = self.arena.alloc_entity(entity);
            let bound = if self.is_blank(name) {
                id
            } else {
                match self.arena.scope_mut(scope).insert(name, id) {
                    Some(prev) => prev, // redeclaration: reuse
                    None => {
                        new_vars += 1;
                        id
                    }
                }
            };
            if let Expr::Ident { entity: slot, .. } = self.arena.expr_mut(x) {
                *slot = Some(bound);
            }
        }
        if new_vars == 0 && self.mode.contains(Mode::DECLARATION_ERRORS) {
            if let Some(&first) = list.first() {
                let pos = self.arena.expr_pos(first);
                self.error(pos, "no new variables on left side of :=")?;
            }
        }
        Ok(())
    }

    /// If `x` is an identifier, bind it to the entity it denotes in the
    /// open scopes, or mark it unresolved. Unresolved identifiers are
    /// retried against the package scope when the file completes.
    pub(crate) fn try_resolve(&mut self, x: ExprId, collect_unresolved: bool) {
        let name = match self.arena.expr(x) {
            Expr::Ident { name, entity, .. } => {
                debug_assert!(entity.is_none(), "identifier already declared or resolved");
                *name
            }
            _ => return,
        };
        if self.is_blank(name) {
            return;
        }
        if let Some(entity) = self.arena.resolve_in_chain(self.top_scope, name) {
            if let Expr::Ident { entity: slot, .. } = self.arena.expr_mut(x) {
                *slot = Some(entity);
            }
            return;
        }
        if collect_unresolved {
            if let Expr::Ident { entity: slot, .. } = self.arena.expr_mut(x) {
                *slot = Some(EntityId::UNRESOLVED);
            }
            self.unresolved.push(x);
        }
    }

    pub(crate) fn resolve(&mut self, x: ExprId) {
        self.try_resolve(x, true);
    }
}
