//! Expression productions: precedence climbing over unary and primary
//! expressions.
//!
//! `lhs` parameters defer identifier resolution: the left-hand side of
//! `:=` declares rather than uses its identifiers, and that is only
//! known once the statement's operator is seen.

use crate::parser::{PResult, Parser};
use crate::recovery::STMT_START;
use gox_ir::{ChanDir, Expr, ExprId, Token};

impl Parser<'_> {
    /// Current token and its binding power; in right-hand-side context
    /// a stray `=` is treated as `==` (a likely typo).
    fn tok_prec(&self) -> (Token, u8) {
        let tok = if self.in_rhs && self.tok == Token::Assign {
            Token::Eql
        } else {
            self.tok
        };
        (tok, tok.precedence())
    }

    pub(crate) fn parse_expr(&mut self, lhs: bool) -> PResult<ExprId> {
        self.parse_binary_expr(lhs, Token::LOWEST_PREC + 1)
    }

    pub(crate) fn parse_rhs(&mut self) -> PResult<ExprId> {
        let old = self.in_rhs;
        self.in_rhs = true;
        let x = self.parse_expr(false)?;
        let x = self.check_expr(x)?;
        self.in_rhs = old;
        Ok(x)
    }

    pub(crate) fn parse_rhs_or_type(&mut self) -> PResult<ExprId> {
        let old = self.in_rhs;
        self.in_rhs = true;
        let x = self.parse_expr(false)?;
        let x = self.check_expr_or_type(x)?;
        self.in_rhs = old;
        Ok(x)
    }

    pub(crate) fn parse_expr_list(&mut self, lhs: bool) -> PResult<Vec<ExprId>> {
        let mut list = Vec::new();
        let x = self.parse_expr(lhs)?;
        list.push(self.check_expr(x)?);
        while self.tok == Token::Comma {
            self.next();
            let x = self.parse_expr(lhs)?;
            list.push(self.check_expr(x)?);
        }
        Ok(list)
    }

    /// Parse an assignment left-hand side. Resolution is deferred when
    /// the list turns out to be declared by `:=` or to be a label.
    pub(crate) fn parse_lhs_list(&mut self) -> PResult<Vec<ExprId>> {
        let old = self.in_rhs;
        self.in_rhs = false;
        let list = self.parse_expr_list(true)?;
        match self.tok {
            // Lhs of a short variable declaration: declared, not used.
            Token::Define => {}
            // Label declaration or the start of a select communication
            // clause; the caller sorts it out.
            Token::Colon => {}
            _ => {
                for &x in &list {
                    self.resolve(x);
                }
            }
        }
        self.in_rhs = old;
        Ok(list)
    }

    pub(crate) fn parse_rhs_list(&mut self) -> PResult<Vec<ExprId>> {
        let old = self.in_rhs;
        self.in_rhs = true;
        let list = self.parse_expr_list(false)?;
        self.in_rhs = old;
        Ok(list)
    }

    fn parse_binary_expr(&mut self, lhs: bool, min_prec: u8) -> PResult<ExprId> {
        let mut lhs = lhs;
        let mut x = self.parse_unary_expr(lhs)?;
        loop {
            let (op, prec) = self.tok_prec();
            if prec < min_prec {
                return Ok(x);
            }
            let op_pos = self.expect(op)?;
            if lhs {
                self.resolve(x);
                lhs = false;
            }
            let y = self.parse_binary_expr(false, prec + 1)?;
            let cx = self.check_expr(x)?;
            let cy = self.check_expr(y)?;
            x = self.arena.alloc_expr(Expr::Binary {
                x: cx,
                op_pos,
                op,
                y: cy,
            });
        }
    }

    fn parse_unary_expr(&mut self, lhs: bool) -> PResult<ExprId> {
        match self.tok {
            Token::Add | Token::Sub | Token::Not | Token::Xor | Token::And => {
                let (pos, op) = (self.pos, self.tok);
                self.next();
                let x = self.parse_unary_expr(false)?;
                let x = self.check_expr(x)?;
                Ok(self.arena.alloc_expr(Expr::Unary { pos, op, expr: x }))
            }

            Token::Arrow => {
                // Channel type or receive expression: `<-chan T` versus
                // `<-expr`. Decided after the operand is parsed, and
                // for channel types the arrow re-associates inward:
                //   <- (chan T)    becomes  (<-chan T)
                //   <- (chan<- T)  becomes  (<-chan (<-T))
                let mut arrow = self.pos;
                self.next();
                let x = self.parse_unary_expr(false)?;

                if matches!(self.arena.expr(x), Expr::ChanType { .. }) {
                    let mut dir = ChanDir::Send;
                    let mut cur = x;
                    loop {
                        let Expr::ChanType {
                            arrow: node_arrow,
                            dir: node_dir,
                            value,
                            ..
                        } = *self.arena.expr(cur)
                        else {
                            break;
                        };
                        if node_dir == ChanDir::Recv {
                            // (<-type) where type is already <-chan.
                            self.error_expected(node_arrow, "'chan'")?;
                        }
                        if let Expr::ChanType {
                            begin,
                            arrow: slot,
                            dir: slot_dir,
                            ..
                        } = self.arena.expr_mut(cur)
                        {
                            *begin = arrow;
                            *slot = arrow;
                            *slot_dir = ChanDir::Recv;
                        }
                        arrow = node_arrow;
                        dir = node_dir;
                        if dir != ChanDir::Send
                            || !matches!(self.arena.expr(value), Expr::ChanType { .. })
                        {
                            break;
                        }
                        cur = value;
                    }
                    if dir == ChanDir::Send {
                        self.error_expected(arrow, "channel type")?;
                    }
                    return Ok(x);
                }

                let x = self.check_expr(x)?;
                Ok(self.arena.alloc_expr(Expr::Unary {
                    pos: arrow,
                    op: Token::Arrow,
                    expr: x,
                }))
            }

            Token::Mul => {
                // Pointer type or dereference.
                let pos = self.pos;
                self.next();
                let x = self.parse_unary_expr(false)?;
                let x = self.check_expr(x)?;
                Ok(self.arena.alloc_expr(Expr::Star { star: pos, expr: x }))
            }

            _ => self.parse_primary_expr(lhs),
        }
    }

    fn parse_primary_expr(&mut self, lhs: bool) -> PResult<ExprId> {
        let mut lhs = lhs;
        let mut x = self.parse_operand(lhs)?;
        loop {
            match self.tok {
                Token::Period => {
                    self.next();
                    if lhs {
                        self.resolve(x);
                    }
                    match self.tok {
                        Token::Ident => {
                            let checked = self.check_expr_or_type(x)?;
                            let sel = self.parse_ident()?;
                            x = self.arena.alloc_expr(Expr::Selector { expr: checked, sel });
                        }
                        Token::Lparen => {
                            let checked = self.check_expr(x)?;
                            x = self.parse_type_assertion(checked)?;
                        }
                        _ => {
                            let pos = self.pos;
                            self.error_expected(pos, "selector or type assertion")?;
                            self.next(); // make progress
                            let blank = self.interner.intern("_");
                            let sel = self.arena.alloc_expr(Expr::Ident {
                                pos,
                                name: blank,
                                entity: None,
                            });
                            x = self.arena.alloc_expr(Expr::Selector { expr: x, sel });
                        }
                    }
                }
                Token::Lbrack => {
                    if lhs {
                        self.resolve(x);
                    }
                    let checked = self.check_expr(x)?;
                    x = self.parse_index_or_slice(checked)?;
                }
                Token::Lparen => {
                    if lhs {
                        self.resolve(x);
                    }
                    let checked = self.check_expr_or_type(x)?;
                    x = self.parse_call_or_conversion(checked)?;
                }
                Token::Lbrace => {
                    // `T{...}` is a composite literal only where a
                    // statement cannot start: inside parens/brackets
                    // (expr_lev >= 0) or when T is structurally a type.
                    if self.is_literal_type(x) && (self.expr_lev >= 0 || !self.is_type_name(x)) {
                        if lhs {
                            self.resolve(x);
                        }
                        x = self.parse_literal_value(Some(x))?;
                    } else {
                        return Ok(x);
                    }
                }
                _ => return Ok(x),
            }
            lhs = false;
        }
    }

    fn parse_operand(&mut self, lhs: bool) -> PResult<ExprId> {
        match self.tok {
            Token::Ident => {
                let x = self.parse_ident()?;
                if !lhs {
                    self.resolve(x);
                }
                return Ok(x);
            }

            Token::Int | Token::Float | Token::Imag | Token::Char | Token::String => {
                let lit = self.interner.intern(&self.lit);
                let x = self.arena.alloc_expr(Expr::BasicLit {
                    pos: self.pos,
                    kind: self.tok,
                    lit,
                });
                self.next();
                return Ok(x);
            }

            Token::Lparen => {
                let lparen = self.pos;
                self.next();
                self.expr_lev += 1;
                let x = self.parse_rhs_or_type()?; // types may be parenthesized
                self.expr_lev -= 1;
                let rparen = self.expect(Token::Rparen)?;
                return Ok(self.arena.alloc_expr(Expr::Paren {
                    lparen,
                    expr: x,
                    rparen,
                }));
            }

            Token::Func => return self.parse_func_type_or_lit(),

            _ => {}
        }

        if let Some(typ) = self.try_ident_or_type()? {
            // Type operand: composite literal type or conversion.
            debug_assert!(
                !matches!(self.arena.expr(typ), Expr::Ident { .. }),
                "type cannot be identifier"
            );
            return Ok(typ);
        }

        let pos = self.pos;
        self.error_expected(pos, "operand")?;
        self.sync(STMT_START);
        Ok(self.arena.alloc_expr(Expr::Bad { from: pos, to: self.pos }))
    }

    fn parse_func_type_or_lit(&mut self) -> PResult<ExprId> {
        let (typ, scope) = self.parse_func_type()?;
        if self.tok != Token::Lbrace {
            // Function type only.
            return Ok(typ);
        }
        self.expr_lev += 1;
        let body = self.parse_body(scope)?;
        self.expr_lev -= 1;
        Ok(self.arena.alloc_expr(Expr::FuncLit { typ, body }))
    }

    fn parse_type_assertion(&mut self, x: ExprId) -> PResult<ExprId> {
        let lparen = self.expect(Token::Lparen)?;
        let typ = if self.tok == Token::Type {
            // Type switch guard: x.(type).
            self.next();
            None
        } else {
            Some(self.parse_type()?)
        };
        let rparen = self.expect(Token::Rparen)?;
        Ok(self.arena.alloc_expr(Expr::TypeAssert {
            expr: x,
            lparen,
            typ,
            rparen,
        }))
    }

    fn parse_index_or_slice(&mut self, x: ExprId) -> PResult<ExprId> {
        let lbrack = self.expect(Token::Lbrack)?;
        self.expr_lev += 1;
        let mut index: [Option<ExprId>; 3] = [None, None, None];
        let mut colons = [gox_ir::Pos::NONE; 2];
        if self.tok != Token::Colon {
            index[0] = Some(self.parse_rhs()?);
        }
        let mut ncolons = 0;
        while self.tok == Token::Colon && ncolons < colons.len() {
            colons[ncolons] = self.pos;
            ncolons += 1;
            self.next();
            if !matches!(self.tok, Token::Colon | Token::Rbrack | Token::Eof) {
                index[ncolons] = Some(self.parse_rhs()?);
            }
        }
        self.expr_lev -= 1;
        let rbrack = self.expect(Token::Rbrack)?;

        if ncolons > 0 {
            let slice3 = ncolons == 2;
            if slice3 {
                // A 3-index slice requires the 2nd and 3rd index.
                if index[1].is_none() {
                    self.error(colons[0], "2nd index required in 3-index slice")?;
                    index[1] = Some(self.arena.alloc_expr(Expr::Bad {
                        from: gox_ir::Pos(colons[0].0 + 1),
                        to: colons[1],
                    }));
                }
                if index[2].is_none() {
                    self.error(colons[1], "3rd index required in 3-index slice")?;
                    index[2] = Some(self.arena.alloc_expr(Expr::Bad {
                        from: gox_ir::Pos(colons[1].0 + 1),
                        to: rbrack,
                    }));
                }
            }
            let [low, high, max] = index;
            return Ok(self.arena.alloc_expr(Expr::Slice {
                expr: x,
                lbrack,
                low,
                high,
                max,
                slice3,
                rbrack,
            }));
        }

        let idx = match index[0] {
            Some(idx) => idx,
            // `x[]` is caught by expect(Rbrack) above; keep the node
            // well-formed anyway.
            None => self.arena.alloc_expr(Expr::Bad {
                from: lbrack,
                to: rbrack,
            }),
        };
        Ok(self.arena.alloc_expr(Expr::Index {
            expr: x,
            lbrack,
            index: idx,
            rbrack,
        }))
    }

    fn parse_call_or_conversion(&mut self, fun: ExprId) -> PResult<ExprId> {
        let lparen = self.expect(Token::Lparen)?;
        self.expr_lev += 1;
        let mut args = Vec::new();
        let mut ellipsis = gox_ir::Pos::NONE;
        while self.tok != Token::Rparen && self.tok != Token::Eof && !ellipsis.is_valid() {
            // Builtins may take a type: make(map[k]v, n).
            args.push(self.parse_rhs_or_type()?);
            if self.tok == Token::Ellipsis {
                ellipsis = self.pos;
                self.next();
            }
            if !self.at_comma("argument list")? {
                break;
            }
            self.next();
        }
        self.expr_lev -= 1;
        let rparen = self.expect_closing(Token::Rparen, "argument list")?;
        Ok(self.arena.alloc_expr(Expr::Call {
            fun,
            lparen,
            args,
            ellipsis,
            rparen,
        }))
    }

    /// One element of a composite literal, possibly `key: value`.
    fn parse_element(&mut self, key_ok: bool) -> PResult<ExprId> {
        if self.tok == Token::Lbrace {
            // Nested literal with elided type.
            return self.parse_literal_value(None);
        }

        let x = self.parse_expr(key_ok)?;
        let x = self.check_expr(x)?;
        if key_ok {
            if self.tok == Token::Colon {
                let colon = self.pos;
                self.next();
                // A key that is an identifier may be a struct field
                // name, which resolves to nothing here; try quietly and
                // leave failures out of the unresolved list.
                self.try_resolve(x, false);
                let value = self.parse_element(false)?;
                return Ok(self.arena.alloc_expr(Expr::KeyValue {
                    key: x,
                    colon,
                    value,
                }));
            }
            self.resolve(x); // not a key after all
        }
        Ok(x)
    }

    fn parse_element_list(&mut self) -> PResult<Vec<ExprId>> {
        let mut list = Vec::new();
        while self.tok != Token::Rbrace && self.tok != Token::Eof {
            list.push(self.parse_element(true)?);
            if !self.at_comma("composite literal")? {
                break;
            }
            self.next();
        }
        Ok(list)
    }

    pub(crate) fn parse_literal_value(&mut self, typ: Option<ExprId>) -> PResult<ExprId> {
        let lbrace = self.expect(Token::Lbrace)?;
        self.expr_lev += 1;
        let elts = if self.tok != Token::Rbrace {
            self.parse_element_list()?
        } else {
            Vec::new()
        };
        self.expr_lev -= 1;
        let rbrace = self.expect_closing(Token::Rbrace, "composite literal")?;
        Ok(self.arena.alloc_expr(Expr::CompositeLit {
            typ,
            lbrace,
            elts,
            rbrace,
        }))
    }

    /// Reject nodes that are types, not expressions, replacing them
    /// with a bad node.
    pub(crate) fn check_expr(&mut self, x: ExprId) -> PResult<ExprId> {
        match self.arena.expr(self.unparen(x)) {
            Expr::Bad { .. }
            | Expr::Ident { .. }
            | Expr::BasicLit { .. }
            | Expr::FuncLit { .. }
            | Expr::CompositeLit { .. }
            | Expr::Selector { .. }
            | Expr::Index { .. }
            | Expr::Slice { .. }
            // x.(type) is only valid in a type switch guard; the
            // statement parser checks that, so be lenient here.
            | Expr::TypeAssert { .. }
            | Expr::Call { .. }
            | Expr::Star { .. }
            | Expr::Unary { .. }
            | Expr::Binary { .. } => Ok(x),
            _ => {
                let from = self.arena.expr_pos(x);
                let to = self.safe_pos(self.arena.expr_end(&self.interner, x));
                self.error_expected(from, "expression")?;
                Ok(self.arena.alloc_expr(Expr::Bad { from, to }))
            }
        }
    }

    /// Like [`check_expr`](Self::check_expr) but types are also fine
    /// (conversions, composite literal types). `[...]T` is a valid
    /// composite-literal type but not a standalone one.
    pub(crate) fn check_expr_or_type(&mut self, x: ExprId) -> PResult<ExprId> {
        if let Expr::ArrayType { len: Some(len), .. } = self.arena.expr(self.unparen(x)) {
            if let Expr::Ellipsis { pos, .. } = self.arena.expr(*len) {
                let pos = *pos;
                self.error(pos, "expected array length, found '...'")?;
                let from = self.arena.expr_pos(x);
                let to = self.safe_pos(self.arena.expr_end(&self.interner, x));
                return Ok(self.arena.alloc_expr(Expr::Bad { from, to }));
            }
        }
        Ok(x)
    }

    /// Wrap a non-expression statement position into a bad expression;
    /// used where the grammar wants an expression but got a statement.
    pub(crate) fn make_bad_expr(&mut self, from: gox_ir::Pos, to: gox_ir::Pos) -> ExprId {
        self.arena.alloc_expr(Expr::Bad { from, to })
    }
}
