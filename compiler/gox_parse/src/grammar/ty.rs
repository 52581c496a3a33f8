//! Type productions.
//!
//! Types and expressions share one node space: an identifier list in a
//! field declaration is indistinguishable from a type list until the
//! whole declaration is seen, so several productions here parse a
//! "variable list" first and classify afterwards.

use crate::parser::{PResult, Parser};
use gox_ir::{
    ChanDir, DeclRef, EntityKind, Expr, ExprId, Field, FieldId, FieldList, Pos, ScopeData,
    ScopeId, Token,
};

impl Parser<'_> {
    /// Parse an identifier, substituting `_` when the current token is
    /// not one (with the usual expect error).
    pub(crate) fn parse_ident(&mut self) -> PResult<ExprId> {
        let pos = self.pos;
        let name;
        if self.tok == Token::Ident {
            name = self.interner.intern(&self.lit);
            self.next();
        } else {
            name = self.interner.intern("_");
            self.expect(Token::Ident)?;
        }
        Ok(self.arena.alloc_expr(Expr::Ident {
            pos,
            name,
            entity: None,
        }))
    }

    pub(crate) fn parse_ident_list(&mut self) -> PResult<Vec<ExprId>> {
        let mut list = vec![self.parse_ident()?];
        while self.tok == Token::Comma {
            self.next();
            list.push(self.parse_ident()?);
        }
        Ok(list)
    }

    pub(crate) fn parse_type(&mut self) -> PResult<ExprId> {
        match self.try_type()? {
            Some(typ) => Ok(typ),
            None => {
                let pos = self.pos;
                self.error_expected(pos, "type")?;
                self.next(); // make progress
                Ok(self.arena.alloc_expr(Expr::Bad { from: pos, to: self.pos }))
            }
        }
    }

    /// A type name: an identifier or a qualified `pkg.Name`. The
    /// identifier is not resolved here; it may turn out to be a field
    /// or parameter name.
    pub(crate) fn parse_type_name(&mut self) -> PResult<ExprId> {
        let ident = self.parse_ident()?;
        if self.tok == Token::Period {
            // The identifier is a package name.
            self.next();
            self.resolve(ident);
            let sel = self.parse_ident()?;
            return Ok(self.arena.alloc_expr(Expr::Selector { expr: ident, sel }));
        }
        Ok(ident)
    }

    fn parse_array_type(&mut self) -> PResult<ExprId> {
        let lbrack = self.expect(Token::Lbrack)?;
        self.expr_lev += 1;
        let len = if self.tok == Token::Ellipsis {
            let ellipsis = self.arena.alloc_expr(Expr::Ellipsis {
                pos: self.pos,
                elt: None,
            });
            self.next();
            Some(ellipsis)
        } else if self.tok != Token::Rbrack {
            Some(self.parse_rhs()?)
        } else {
            None
        };
        self.expr_lev -= 1;
        self.expect(Token::Rbrack)?;
        let elt = self.parse_type()?;
        Ok(self.arena.alloc_expr(Expr::ArrayType { lbrack, len, elt }))
    }

    /// Replace every non-identifier in `list` with a blank identifier,
    /// reporting the first-time offenders.
    fn make_ident_list(&mut self, list: &[ExprId]) -> PResult<Vec<ExprId>> {
        let mut idents = Vec::with_capacity(list.len());
        for &x in list {
            let ident = match self.arena.expr(x) {
                Expr::Ident { .. } => x,
                other => {
                    if !matches!(other, Expr::Bad { .. }) {
                        // Only report new problems.
                        let pos = self.arena.expr_pos(x);
                        self.error_expected(pos, "identifier")?;
                    }
                    let pos = self.arena.expr_pos(x);
                    let blank = self.interner.intern("_");
                    self.arena.alloc_expr(Expr::Ident {
                        pos,
                        name: blank,
                        entity: None,
                    })
                }
            };
            idents.push(ident);
        }
        Ok(idents)
    }

    fn parse_field_decl(&mut self, scope: ScopeId) -> PResult<FieldId> {
        let doc = self.lead_comment;

        let (list, typ) = self.parse_var_list(false)?;

        let tag = if self.tok == Token::String {
            let lit = self.interner.intern(&self.lit);
            let tag = self.arena.alloc_expr(Expr::BasicLit {
                pos: self.pos,
                kind: self.tok,
                lit,
            });
            self.next();
            Some(tag)
        } else {
            None
        };

        let (names, typ) = if let Some(typ) = typ {
            // IdentifierList Type
            (self.make_ident_list(&list)?, typ)
        } else {
            // Embedded field: ["*"] TypeName
            let typ = list[0];
            let typ = if list.len() > 1 || !self.is_type_name(self.deref_expr(typ)) {
                let pos = self.arena.expr_pos(typ);
                self.error_expected(pos, "embedded field")?;
                let last = list[list.len() - 1];
                let to = self.safe_pos(self.arena.expr_end(&self.interner, last));
                self.arena.alloc_expr(Expr::Bad { from: pos, to })
            } else {
                typ
            };
            (Vec::new(), typ)
        };

        self.expect_semi()?; // before reading the line comment

        let field = self.arena.alloc_field(Field {
            doc,
            names: names.clone(),
            typ,
            tag,
            comment: self.line_comment,
        });
        self.declare(DeclRef::Field(field), None, scope, EntityKind::Var, &names)?;
        self.resolve(typ);

        Ok(field)
    }

    fn parse_struct_type(&mut self) -> PResult<ExprId> {
        let pos = self.expect(Token::Struct)?;
        let lbrace = self.expect(Token::Lbrace)?;
        let scope = self.arena.alloc_scope(ScopeData::new(None)); // struct scope
        let mut list = Vec::new();
        while matches!(self.tok, Token::Ident | Token::Mul | Token::Lparen) {
            // A field declaration cannot start with '(' but permitting
            // it here gives better errors from parse_field_decl.
            list.push(self.parse_field_decl(scope)?);
        }
        let rbrace = self.expect(Token::Rbrace)?;

        Ok(self.arena.alloc_expr(Expr::StructType {
            pos,
            fields: FieldList {
                opening: lbrace,
                list,
                closing: rbrace,
            },
            incomplete: false,
        }))
    }

    fn parse_pointer_type(&mut self) -> PResult<ExprId> {
        let star = self.expect(Token::Mul)?;
        let base = self.parse_type()?;
        Ok(self.arena.alloc_expr(Expr::Star { star, expr: base }))
    }

    /// Parse a type in a variable list. `None` when the current token
    /// cannot start one. In parameter lists, `...T` is allowed.
    fn try_var_type(&mut self, is_param: bool) -> PResult<Option<ExprId>> {
        if is_param && self.tok == Token::Ellipsis {
            let pos = self.pos;
            self.next();
            let elt = match self.try_ident_or_type()? {
                Some(typ) => {
                    self.resolve(typ);
                    typ
                }
                None => {
                    self.error(pos, "'...' parameter is missing type")?;
                    self.arena.alloc_expr(Expr::Bad { from: pos, to: self.pos })
                }
            };
            return Ok(Some(
                self.arena.alloc_expr(Expr::Ellipsis { pos, elt: Some(elt) }),
            ));
        }
        self.try_ident_or_type()
    }

    fn parse_var_type(&mut self, is_param: bool) -> PResult<ExprId> {
        match self.try_var_type(is_param)? {
            Some(typ) => Ok(typ),
            None => {
                let pos = self.pos;
                self.error_expected(pos, "type")?;
                self.next(); // make progress
                Ok(self.arena.alloc_expr(Expr::Bad { from: pos, to: self.pos }))
            }
        }
    }

    /// Parse a comma-separated list that is either an identifier list
    /// followed by a type, or a list of types. Returns the list and the
    /// trailing type, if any.
    fn parse_var_list(&mut self, is_param: bool) -> PResult<(Vec<ExprId>, Option<ExprId>)> {
        let mut list = Vec::new();

        // A list of identifiers looks like a list of type names until
        // the token after the list is seen.
        list.push(self.parse_var_type(is_param)?);
        while self.tok == Token::Comma {
            self.next();
            match self.try_var_type(is_param)? {
                Some(typ) => list.push(typ),
                None => break,
            }
        }

        // If this was an identifier list, a type follows.
        let typ = self.try_var_type(is_param)?;
        Ok((list, typ))
    }

    fn parse_parameter_list(
        &mut self,
        scope: ScopeId,
        ellipsis_ok: bool,
    ) -> PResult<Vec<FieldId>> {
        let mut params = Vec::new();
        let (list, typ) = self.parse_var_list(ellipsis_ok)?;

        if let Some(typ) = typ {
            // IdentifierList Type
            let idents = self.make_ident_list(&list)?;
            let field = self.arena.alloc_field(Field {
                doc: None,
                names: idents.clone(),
                typ,
                tag: None,
                comment: None,
            });
            params.push(field);
            // Parameters and results are in scope in the function body.
            self.declare(DeclRef::Field(field), None, scope, EntityKind::Var, &idents)?;
            self.resolve(typ);
            if !self.at_comma("parameter list")? {
                return Ok(params);
            }
            self.next();
            while self.tok != Token::Rparen && self.tok != Token::Eof {
                let idents = self.parse_ident_list()?;
                let typ = self.parse_var_type(ellipsis_ok)?;
                let field = self.arena.alloc_field(Field {
                    doc: None,
                    names: idents.clone(),
                    typ,
                    tag: None,
                    comment: None,
                });
                params.push(field);
                self.declare(DeclRef::Field(field), None, scope, EntityKind::Var, &idents)?;
                self.resolve(typ);
                if !self.at_comma("parameter list")? {
                    break;
                }
                self.next();
            }
            return Ok(params);
        }

        // Type { "," Type }: unnamed parameters.
        for typ in list {
            self.resolve(typ);
            params.push(self.arena.alloc_field(Field {
                doc: None,
                names: Vec::new(),
                typ,
                tag: None,
                comment: None,
            }));
        }
        Ok(params)
    }

    pub(crate) fn parse_parameters(
        &mut self,
        scope: ScopeId,
        ellipsis_ok: bool,
    ) -> PResult<FieldList> {
        let lparen = self.expect(Token::Lparen)?;
        let list = if self.tok != Token::Rparen {
            self.parse_parameter_list(scope, ellipsis_ok)?
        } else {
            Vec::new()
        };
        let rparen = self.expect(Token::Rparen)?;
        Ok(FieldList {
            opening: lparen,
            list,
            closing: rparen,
        })
    }

    fn parse_result(&mut self, scope: ScopeId) -> PResult<Option<FieldList>> {
        if self.tok == Token::Lparen {
            return Ok(Some(self.parse_parameters(scope, false)?));
        }
        if let Some(typ) = self.try_type()? {
            let field = self.arena.alloc_field(Field {
                doc: None,
                names: Vec::new(),
                typ,
                tag: None,
                comment: None,
            });
            return Ok(Some(FieldList {
                opening: Pos::NONE,
                list: vec![field],
                closing: Pos::NONE,
            }));
        }
        Ok(None)
    }

    pub(crate) fn parse_signature(
        &mut self,
        scope: ScopeId,
    ) -> PResult<(FieldList, Option<FieldList>)> {
        let params = self.parse_parameters(scope, true)?;
        let results = self.parse_result(scope)?;
        Ok((params, results))
    }

    /// Parse `func(...)...`; returns the type node and the function
    /// scope its parameters were declared in.
    pub(crate) fn parse_func_type(&mut self) -> PResult<(ExprId, ScopeId)> {
        let pos = self.expect(Token::Func)?;
        let scope = self.arena.alloc_scope(ScopeData::new(self.top_scope));
        let (params, results) = self.parse_signature(scope)?;
        let typ = self.arena.alloc_expr(Expr::FuncType {
            pos,
            params,
            results,
        });
        Ok((typ, scope))
    }

    fn parse_method_spec(&mut self, scope: ScopeId) -> PResult<FieldId> {
        let doc = self.lead_comment;
        let mut names = Vec::new();
        let x = self.parse_type_name()?;
        let typ = if matches!(self.arena.expr(x), Expr::Ident { .. }) && self.tok == Token::Lparen
        {
            // Method signature.
            names.push(x);
            let method_scope = self.arena.alloc_scope(ScopeData::new(None));
            let (params, results) = self.parse_signature(method_scope)?;
            self.arena.alloc_expr(Expr::FuncType {
                pos: Pos::NONE,
                params,
                results,
            })
        } else {
            // Embedded interface.
            self.resolve(x);
            x
        };
        self.expect_semi()?; // before reading the line comment

        let field = self.arena.alloc_field(Field {
            doc,
            names: names.clone(),
            typ,
            tag: None,
            comment: self.line_comment,
        });
        self.declare(DeclRef::Field(field), None, scope, EntityKind::Func, &names)?;
        Ok(field)
    }

    fn parse_interface_type(&mut self) -> PResult<ExprId> {
        let pos = self.expect(Token::Interface)?;
        let lbrace = self.expect(Token::Lbrace)?;
        let scope = self.arena.alloc_scope(ScopeData::new(None)); // interface scope
        let mut list = Vec::new();
        while self.tok == Token::Ident {
            list.push(self.parse_method_spec(scope)?);
        }
        let rbrace = self.expect(Token::Rbrace)?;

        Ok(self.arena.alloc_expr(Expr::InterfaceType {
            pos,
            methods: FieldList {
                opening: lbrace,
                list,
                closing: rbrace,
            },
            incomplete: false,
        }))
    }

    fn parse_map_type(&mut self) -> PResult<ExprId> {
        let pos = self.expect(Token::Map)?;
        self.expect(Token::Lbrack)?;
        let key = self.parse_type()?;
        self.expect(Token::Rbrack)?;
        let value = self.parse_type()?;
        Ok(self.arena.alloc_expr(Expr::MapType { pos, key, value }))
    }

    fn parse_chan_type(&mut self) -> PResult<ExprId> {
        let pos = self.pos;
        let mut dir = ChanDir::Both;
        let mut arrow = Pos::NONE;
        if self.tok == Token::Chan {
            self.next();
            if self.tok == Token::Arrow {
                arrow = self.pos;
                self.next();
                dir = ChanDir::Send;
            }
        } else {
            arrow = self.expect(Token::Arrow)?;
            self.expect(Token::Chan)?;
            dir = ChanDir::Recv;
        }
        let value = self.parse_type()?;
        Ok(self.arena.alloc_expr(Expr::ChanType {
            begin: pos,
            arrow,
            dir,
            value,
        }))
    }

    /// Dispatch on the current token; `None` if it cannot start a type.
    /// The result is not resolved.
    pub(crate) fn try_ident_or_type(&mut self) -> PResult<Option<ExprId>> {
        let typ = match self.tok {
            Token::Ident => self.parse_type_name()?,
            Token::Lbrack => self.parse_array_type()?,
            Token::Struct => self.parse_struct_type()?,
            Token::Mul => self.parse_pointer_type()?,
            Token::Func => self.parse_func_type()?.0,
            Token::Interface => self.parse_interface_type()?,
            Token::Map => self.parse_map_type()?,
            Token::Chan | Token::Arrow => self.parse_chan_type()?,
            Token::Lparen => {
                let lparen = self.pos;
                self.next();
                let typ = self.parse_type()?;
                let rparen = self.expect(Token::Rparen)?;
                self.arena.alloc_expr(Expr::Paren {
                    lparen,
                    expr: typ,
                    rparen,
                })
            }
            _ => return Ok(None),
        };
        Ok(Some(typ))
    }

    pub(crate) fn try_type(&mut self) -> PResult<Option<ExprId>> {
        let typ = self.try_ident_or_type()?;
        if let Some(typ) = typ {
            self.resolve(typ);
        }
        Ok(typ)
    }

    // === Shared expression shape helpers ===

    /// Strip a leading `*`.
    pub(crate) fn deref_expr(&self, x: ExprId) -> ExprId {
        match self.arena.expr(x) {
            Expr::Star { expr, .. } => *expr,
            _ => x,
        }
    }

    /// Strip any number of parentheses.
    pub(crate) fn unparen(&self, x: ExprId) -> ExprId {
        match self.arena.expr(x) {
            Expr::Paren { expr, .. } => self.unparen(*expr),
            _ => x,
        }
    }

    /// `true` for expressions that may denote a type name: bad
    /// expressions, identifiers, and qualified identifiers.
    pub(crate) fn is_type_name(&self, x: ExprId) -> bool {
        match self.arena.expr(x) {
            Expr::Bad { .. } | Expr::Ident { .. } => true,
            Expr::Selector { expr, .. } => matches!(self.arena.expr(*expr), Expr::Ident { .. }),
            _ => false,
        }
    }

    /// `true` for expressions that may appear as the type in a
    /// composite literal.
    pub(crate) fn is_literal_type(&self, x: ExprId) -> bool {
        match self.arena.expr(x) {
            Expr::Bad { .. }
            | Expr::Ident { .. }
            | Expr::ArrayType { .. }
            | Expr::StructType { .. }
            | Expr::MapType { .. } => true,
            Expr::Selector { expr, .. } => matches!(self.arena.expr(*expr), Expr::Ident { .. }),
            _ => false,
        }
    }
}
