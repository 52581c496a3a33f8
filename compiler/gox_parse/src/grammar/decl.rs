//! Declaration productions and the file production.

use crate::parser::{PResult, Parser};
use crate::recovery::{TokenSet, DECL_START};
use crate::Mode;
use gox_ir::{
    Decl, DeclId, DeclRef, EntityId, EntityKind, Expr, Field, FileNode, Pos, ScopeData, Spec,
    SpecId, Token,
};

/// An import path must be a non-empty string of graphic, non-space
/// characters outside a small punctuation blacklist.
fn is_valid_import(lit: &str) -> bool {
    const ILLEGAL: &str = "!\"#$%&'()*,:;<=>?[\\]^{|}`\u{FFFD}";
    let body = lit
        .strip_prefix(['"', '`'])
        .and_then(|s| s.strip_suffix(['"', '`']))
        .unwrap_or(lit);
    !body.is_empty()
        && body
            .chars()
            .all(|ch| !ch.is_whitespace() && !ch.is_control() && !ILLEGAL.contains(ch))
}

impl Parser<'_> {
    fn parse_import_spec(&mut self, doc: Option<gox_ir::CommentId>) -> PResult<SpecId> {
        self.trace_enter("ImportSpec");
        let name = match self.tok {
            Token::Period => {
                let pos = self.pos;
                let dot = self.interner.intern(".");
                self.next();
                Some(self.arena.alloc_expr(Expr::Ident {
                    pos,
                    name: dot,
                    entity: None,
                }))
            }
            Token::Ident => Some(self.parse_ident()?),
            _ => None,
        };

        let pos = self.pos;
        let path;
        if self.tok == Token::String {
            if !is_valid_import(&self.lit) {
                self.error(pos, format!("invalid import path: {}", self.lit))?;
            }
            path = self.interner.intern(&self.lit);
            self.next();
        } else {
            path = self.interner.intern("");
            self.expect(Token::String)?; // for the error message
        }
        let path = self.arena.alloc_expr(Expr::BasicLit {
            pos,
            kind: Token::String,
            lit: path,
        });
        self.expect_semi()?; // sets line_comment

        let spec = self.arena.alloc_spec(Spec::Import {
            doc,
            name,
            path,
            comment: self.line_comment,
            end_pos: Pos::NONE,
        });
        self.imports.push(spec);
        self.trace_leave();
        Ok(spec)
    }

    /// A const or var spec. For consts, `iota` is the spec's index
    /// within its declaration group and is recorded on the entities.
    fn parse_value_spec(
        &mut self,
        doc: Option<gox_ir::CommentId>,
        keyword: Token,
        iota: u32,
    ) -> PResult<SpecId> {
        self.trace_enter("ValueSpec");
        let names = self.parse_ident_list()?;
        let typ = self.try_type()?;
        let values = if self.tok == Token::Assign {
            self.next();
            self.parse_rhs_list()?
        } else {
            Vec::new()
        };
        let pos = self.pos;
        self.expect_semi()?; // sets line_comment

        match keyword {
            Token::Var => {
                if typ.is_none() && values.is_empty() {
                    self.error(pos, "missing variable type or initialization")?;
                }
            }
            Token::Const => {
                if values.is_empty() && (iota == 0 || typ.is_some()) {
                    self.error(pos, "missing constant value")?;
                }
            }
            _ => {}
        }

        let spec = self.arena.alloc_spec(Spec::Value {
            doc,
            names: names.clone(),
            typ,
            values,
            comment: self.line_comment,
        });
        // The declared names are in scope from the end of the spec on;
        // package-level names are re-resolved after the whole file.
        let kind = if keyword == Token::Var {
            EntityKind::Var
        } else {
            EntityKind::Const
        };
        let scope = match self.top_scope {
            Some(s) => s,
            None => unreachable!("value spec outside any scope"),
        };
        self.declare(DeclRef::Spec(spec), Some(iota), scope, kind, &names)?;
        self.trace_leave();
        Ok(spec)
    }

    fn parse_type_spec(&mut self, doc: Option<gox_ir::CommentId>) -> PResult<SpecId> {
        self.trace_enter("TypeSpec");
        let name = self.parse_ident()?;
        // The type name is in scope starting at the identifier, so the
        // type may refer to itself. Declare before parsing the type,
        // with a placeholder that is patched below.
        let placeholder = self.arena.alloc_expr(Expr::Bad {
            from: self.pos,
            to: self.pos,
        });
        let spec = self.arena.alloc_spec(Spec::Type {
            doc,
            name,
            typ: placeholder,
            comment: None,
        });
        let scope = match self.top_scope {
            Some(s) => s,
            None => unreachable!("type spec outside any scope"),
        };
        self.declare(DeclRef::Spec(spec), None, scope, EntityKind::Type, &[name])?;

        let parsed = self.parse_type()?;
        self.expect_semi()?; // sets line_comment
        if let Spec::Type { typ, comment, .. } = self.arena.spec_mut(spec) {
            *typ = parsed;
            *comment = self.line_comment;
        }
        self.trace_leave();
        Ok(spec)
    }

    fn parse_gen_decl(&mut self, keyword: Token) -> PResult<DeclId> {
        self.trace_enter("GenDecl");
        let doc = self.lead_comment;
        let pos = self.expect(keyword)?;
        let mut lparen = Pos::NONE;
        let mut rparen = Pos::NONE;
        let mut specs = Vec::new();
        if self.tok == Token::Lparen {
            lparen = self.pos;
            self.next();
            let mut iota = 0;
            while self.tok != Token::Rparen && self.tok != Token::Eof {
                let spec_doc = self.lead_comment;
                specs.push(self.parse_spec(spec_doc, keyword, iota)?);
                iota += 1;
            }
            rparen = self.expect(Token::Rparen)?;
            self.expect_semi()?;
        } else {
            // The comment group documents the declaration, not the spec.
            specs.push(self.parse_spec(None, keyword, 0)?);
        }
        self.trace_leave();
        Ok(self.arena.alloc_decl(Decl::Gen {
            doc,
            tok_pos: pos,
            tok: keyword,
            lparen,
            specs,
            rparen,
        }))
    }

    fn parse_spec(
        &mut self,
        doc: Option<gox_ir::CommentId>,
        keyword: Token,
        iota: u32,
    ) -> PResult<SpecId> {
        match keyword {
            Token::Import => self.parse_import_spec(doc),
            Token::Const | Token::Var => self.parse_value_spec(doc, keyword, iota),
            Token::Type => self.parse_type_spec(doc),
            _ => unreachable!("not a declaration keyword"),
        }
    }

    fn parse_func_decl(&mut self) -> PResult<DeclId> {
        self.trace_enter("FunctionDecl");
        let doc = self.lead_comment;
        let pos = self.expect(Token::Func)?;
        let scope = self.arena.alloc_scope(ScopeData::new(self.top_scope));

        let mut recv = None;
        if self.tok == Token::Lparen {
            let mut par = self.parse_parameters(scope, false)?;
            if par.num_fields(&self.arena) != 1 {
                self.error_expected(par.opening, "exactly one receiver")?;
                let bad = self.arena.alloc_expr(Expr::Bad {
                    from: par.opening,
                    to: Pos(par.closing.0 + 1),
                });
                par.list = vec![self.arena.alloc_field(Field {
                    doc: None,
                    names: Vec::new(),
                    typ: bad,
                    tag: None,
                    comment: None,
                })];
            }
            recv = Some(par);
        }

        let name = self.parse_ident()?;
        let (params, results) = self.parse_signature(scope)?;
        let typ = self.arena.alloc_expr(Expr::FuncType {
            pos,
            params,
            results,
        });

        let recv_absent = recv.is_none();
        let body = if self.tok == Token::Lbrace {
            Some(self.parse_body(scope)?)
        } else {
            None
        };
        self.expect_semi()?;

        let decl = self.arena.alloc_decl(Decl::Func {
            doc,
            recv,
            name,
            typ,
            body,
        });
        if recv_absent {
            // Methods stay out of the package scope; so does `init`,
            // which cannot be referred to and may occur more than once.
            let is_init = match self.arena.expr(name) {
                Expr::Ident { name, .. } => self.interner.lookup(*name) == "init",
                _ => true,
            };
            if !is_init {
                let scope = match self.pkg_scope {
                    Some(s) => s,
                    None => unreachable!("function declaration outside a file"),
                };
                self.declare(DeclRef::Decl(decl), None, scope, EntityKind::Func, &[name])?;
            }
        }
        self.trace_leave();
        Ok(decl)
    }

    pub(crate) fn parse_decl(&mut self, sync_to: TokenSet) -> PResult<DeclId> {
        match self.tok {
            Token::Const | Token::Type | Token::Var => self.parse_gen_decl(self.tok),
            Token::Import => self.parse_gen_decl(Token::Import),
            Token::Func => self.parse_func_decl(),
            _ => {
                let pos = self.pos;
                self.error_expected(pos, "declaration")?;
                self.sync(sync_to);
                Ok(self.arena.alloc_decl(Decl::Bad { from: pos, to: self.pos }))
            }
        }
    }

    /// The file production. Returns `None` when the package clause was
    /// broken enough that the input is probably not a source file.
    pub(crate) fn parse_file(&mut self) -> PResult<Option<FileNode>> {
        // Scan errors on the first token already suggest this is not a
        // source file at all.
        if !self.errors.borrow().is_empty() {
            return Ok(None);
        }

        self.file_doc = self.lead_comment;
        self.package_pos = self.expect(Token::Package)?;
        // The package name does not appear in any scope.
        let name = self.parse_ident()?;
        if let Expr::Ident { name: n, pos, .. } = self.arena.expr(name) {
            let (n, pos) = (*n, *pos);
            if self.is_blank(n) && self.mode.contains(Mode::DECLARATION_ERRORS) {
                self.error(pos, "invalid package name _")?;
            }
        }
        self.package_name = Some(name);
        self.expect_semi()?;

        if !self.errors.borrow().is_empty() {
            return Ok(None);
        }

        self.open_scope();
        self.pkg_scope = self.top_scope;
        if !self.mode.contains(Mode::PACKAGE_CLAUSE_ONLY) {
            while self.tok == Token::Import {
                let decl = self.parse_gen_decl(Token::Import)?;
                self.decls.push(decl);
            }
            if !self.mode.contains(Mode::IMPORTS_ONLY) {
                while self.tok != Token::Eof {
                    let decl = self.parse_decl(DECL_START)?;
                    self.decls.push(decl);
                }
            }
        }
        self.close_scope();
        debug_assert!(self.top_scope.is_none(), "unbalanced scopes");
        debug_assert!(self.label_scope.is_none(), "unbalanced label scopes");

        Ok(Some(self.assemble_file()))
    }

    /// Build the file node from the parser's accumulated state,
    /// re-resolving file-level unresolved identifiers against the
    /// package scope. Also used for partial files after a bail-out.
    pub(crate) fn assemble_file(&mut self) -> FileNode {
        let pkg_scope = match self.pkg_scope {
            Some(s) => s,
            // Bailed out before the package scope opened.
            None => self.arena.alloc_scope(ScopeData::new(None)),
        };
        let name = match self.package_name {
            Some(n) => n,
            None => self.arena.alloc_expr(Expr::Ident {
                pos: Pos::NONE,
                name: self.interner.intern("_"),
                entity: None,
            }),
        };

        let mut still_unresolved = Vec::new();
        for ident in std::mem::take(&mut self.unresolved) {
            let n = match self.arena.expr(ident) {
                Expr::Ident { name, .. } => *name,
                _ => continue,
            };
            match self.arena.scope(pkg_scope).lookup(n) {
                Some(entity) => {
                    if let Expr::Ident { entity: slot, .. } = self.arena.expr_mut(ident) {
                        *slot = Some(entity);
                    }
                }
                None => {
                    if let Expr::Ident { entity: slot, .. } = self.arena.expr_mut(ident) {
                        *slot = Some(EntityId::UNRESOLVED);
                    }
                    still_unresolved.push(ident);
                }
            }
        }

        FileNode {
            doc: self.file_doc,
            package: self.package_pos,
            name,
            decls: std::mem::take(&mut self.decls),
            scope: pkg_scope,
            imports: std::mem::take(&mut self.imports),
            unresolved: still_unresolved,
            comments: std::mem::take(&mut self.comments),
        }
    }
}
