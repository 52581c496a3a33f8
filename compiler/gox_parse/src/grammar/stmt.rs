//! Statement productions.

use crate::parser::{PResult, Parser};
use crate::recovery::STMT_START;
use gox_ir::{DeclRef, EntityKind, Expr, ExprId, Pos, ScopeId, Stmt, StmtId, Token};

/// Context for a simple statement: whether a label declaration or a
/// range clause is admissible at this point.
#[derive(Copy, Clone, Eq, PartialEq)]
pub(crate) enum SimpleMode {
    Basic,
    LabelOk,
    RangeOk,
}

impl Parser<'_> {
    pub(crate) fn parse_stmt(&mut self) -> PResult<StmtId> {
        self.trace_enter("Statement");
        let s = self.parse_stmt_inner();
        self.trace_leave();
        s
    }

    fn parse_stmt_inner(&mut self) -> PResult<StmtId> {
        match self.tok {
            Token::Const | Token::Type | Token::Var => {
                let decl = self.parse_decl(STMT_START)?;
                Ok(self.arena.alloc_stmt(Stmt::Decl(decl)))
            }

            // Tokens that may start an expression: operands, composite
            // types, unary operators.
            Token::Ident
            | Token::Int
            | Token::Float
            | Token::Imag
            | Token::Char
            | Token::String
            | Token::Func
            | Token::Lparen
            | Token::Lbrack
            | Token::Struct
            | Token::Map
            | Token::Chan
            | Token::Interface
            | Token::Add
            | Token::Sub
            | Token::Mul
            | Token::And
            | Token::Xor
            | Token::Arrow
            | Token::Not => {
                let (s, _) = self.parse_simple_stmt(SimpleMode::LabelOk)?;
                // A labeled statement consumed its trailing semicolon
                // while parsing the statement after the label.
                if !matches!(self.arena.stmt(s), Stmt::Labeled { .. }) {
                    self.expect_semi()?;
                }
                Ok(s)
            }

            Token::Go => self.parse_go_stmt(),
            Token::Defer => self.parse_defer_stmt(),
            Token::Return => self.parse_return_stmt(),
            Token::Break | Token::Continue | Token::Goto | Token::Fallthrough => {
                self.parse_branch_stmt(self.tok)
            }
            Token::Lbrace => {
                let s = self.parse_block_stmt()?;
                self.expect_semi()?;
                Ok(s)
            }
            Token::If => self.parse_if_stmt(),
            Token::Switch => self.parse_switch_stmt(),
            Token::Select => self.parse_select_stmt(),
            Token::For => self.parse_for_stmt(),

            Token::Semicolon => {
                // An inserted semicolon can legitimately stand alone.
                let s = self.arena.alloc_stmt(Stmt::Empty {
                    semicolon: self.pos,
                    implicit: self.lit == "\n",
                });
                self.next();
                Ok(s)
            }
            Token::Rbrace => {
                // A semicolon may be omitted before a closing brace.
                Ok(self.arena.alloc_stmt(Stmt::Empty {
                    semicolon: self.pos,
                    implicit: true,
                }))
            }

            _ => {
                let pos = self.pos;
                self.error_expected(pos, "statement")?;
                self.sync(STMT_START);
                Ok(self.arena.alloc_stmt(Stmt::Bad { from: pos, to: self.pos }))
            }
        }
    }

    /// Parse an assignment, send, inc/dec, labeled, or expression
    /// statement. The `bool` result reports whether a range clause was
    /// seen (only possible in [`SimpleMode::RangeOk`]).
    pub(crate) fn parse_simple_stmt(&mut self, mode: SimpleMode) -> PResult<(StmtId, bool)> {
        let x = self.parse_lhs_list()?;

        match self.tok {
            Token::Define
            | Token::Assign
            | Token::AddAssign
            | Token::SubAssign
            | Token::MulAssign
            | Token::QuoAssign
            | Token::RemAssign
            | Token::AndAssign
            | Token::OrAssign
            | Token::XorAssign
            | Token::ShlAssign
            | Token::ShrAssign
            | Token::AndNotAssign => {
                // Assignment, possibly the start of a range clause.
                let (tok_pos, tok) = (self.pos, self.tok);
                self.next();
                let mut is_range = false;
                let rhs = if mode == SimpleMode::RangeOk
                    && self.tok == Token::Range
                    && (tok == Token::Define || tok == Token::Assign)
                {
                    self.next();
                    is_range = true;
                    vec![self.parse_rhs()?]
                } else {
                    self.parse_rhs_list()?
                };
                let s = self.arena.alloc_stmt(Stmt::Assign {
                    lhs: x.clone(),
                    tok_pos,
                    op: tok,
                    rhs,
                });
                if tok == Token::Define {
                    self.short_var_decl(DeclRef::Stmt(s), &x)?;
                }
                return Ok((s, is_range));
            }
            _ => {}
        }

        if x.len() > 1 {
            let pos = self.arena.expr_pos(x[0]);
            self.error_expected(pos, "1 expression")?;
            // Continue with the first expression.
        }

        match self.tok {
            Token::Colon => {
                let colon = self.pos;
                self.next();
                let is_ident = matches!(self.arena.expr(x[0]), Expr::Ident { .. });
                if mode == SimpleMode::LabelOk && is_ident {
                    // The label's scope is the whole enclosing function
                    // body, excluding nested function literals.
                    let stmt = self.parse_stmt()?;
                    let s = self.arena.alloc_stmt(Stmt::Labeled {
                        label: x[0],
                        colon,
                        stmt,
                    });
                    if let Some(scope) = self.label_scope {
                        self.declare(DeclRef::Stmt(s), None, scope, EntityKind::Label, &[x[0]])?;
                    }
                    return Ok((s, false));
                }
                self.error(colon, "illegal label declaration")?;
                let from = self.arena.expr_pos(x[0]);
                let s = self.arena.alloc_stmt(Stmt::Bad {
                    from,
                    to: Pos(colon.0 + 1),
                });
                Ok((s, false))
            }

            Token::Arrow => {
                let arrow = self.pos;
                self.next();
                let value = self.parse_rhs()?;
                let s = self.arena.alloc_stmt(Stmt::Send {
                    chan: x[0],
                    arrow,
                    value,
                });
                Ok((s, false))
            }

            Token::Inc | Token::Dec => {
                let s = self.arena.alloc_stmt(Stmt::IncDec {
                    expr: x[0],
                    tok_pos: self.pos,
                    op: self.tok,
                });
                self.next();
                Ok((s, false))
            }

            _ => Ok((self.arena.alloc_stmt(Stmt::Expr(x[0])), false)),
        }
    }

    /// Turn an expression statement into its expression; anything else
    /// becomes a bad expression with a diagnostic.
    fn make_expr(&mut self, s: StmtId, kind: &str) -> PResult<ExprId> {
        if let Stmt::Expr(x) = *self.arena.stmt(s) {
            return self.check_expr(x);
        }
        let from = self.arena.stmt_pos(s);
        let to = self.safe_pos(self.arena.stmt_end(&self.interner, s));
        self.error(
            from,
            format!("expected {kind}, found simple statement (missing parentheses around composite literal?)"),
        )?;
        Ok(self.make_bad_expr(from, to))
    }

    fn parse_call_expr(&mut self, call_type: &str) -> PResult<Option<ExprId>> {
        let x = self.parse_rhs_or_type()?; // could be a conversion: (T)(x)
        match self.arena.expr(self.unparen(x)) {
            Expr::Call { .. } => Ok(Some(x)),
            Expr::Bad { .. } => Ok(None), // already reported
            _ => {
                let end = self.safe_pos(self.arena.expr_end(&self.interner, x));
                self.error(
                    end,
                    format!("function must be invoked in {call_type} statement"),
                )?;
                Ok(None)
            }
        }
    }

    fn parse_go_stmt(&mut self) -> PResult<StmtId> {
        let pos = self.expect(Token::Go)?;
        let call = self.parse_call_expr("go")?;
        self.expect_semi()?;
        match call {
            Some(call) => Ok(self.arena.alloc_stmt(Stmt::Go { go: pos, call })),
            None => Ok(self.arena.alloc_stmt(Stmt::Bad {
                from: pos,
                to: Pos(pos.0 + 2), // len("go")
            })),
        }
    }

    fn parse_defer_stmt(&mut self) -> PResult<StmtId> {
        let pos = self.expect(Token::Defer)?;
        let call = self.parse_call_expr("defer")?;
        self.expect_semi()?;
        match call {
            Some(call) => Ok(self.arena.alloc_stmt(Stmt::Defer {
                defer_pos: pos,
                call,
            })),
            None => Ok(self.arena.alloc_stmt(Stmt::Bad {
                from: pos,
                to: Pos(pos.0 + 5), // len("defer")
            })),
        }
    }

    fn parse_return_stmt(&mut self) -> PResult<StmtId> {
        let pos = self.pos;
        self.expect(Token::Return)?;
        let results = if self.tok != Token::Semicolon && self.tok != Token::Rbrace {
            self.parse_rhs_list()?
        } else {
            Vec::new()
        };
        self.expect_semi()?;
        Ok(self.arena.alloc_stmt(Stmt::Return {
            return_pos: pos,
            results,
        }))
    }

    fn parse_branch_stmt(&mut self, tok: Token) -> PResult<StmtId> {
        let pos = self.expect(tok)?;
        let mut label = None;
        if tok != Token::Fallthrough && self.tok == Token::Ident {
            let ident = self.parse_ident()?;
            // Resolved against the label scope when it closes.
            if let Some(targets) = self.target_stack.last_mut() {
                targets.push(ident);
            }
            label = Some(ident);
        }
        self.expect_semi()?;
        Ok(self.arena.alloc_stmt(Stmt::Branch {
            pos,
            op: tok,
            label,
        }))
    }

    fn parse_stmt_list(&mut self) -> PResult<Vec<StmtId>> {
        let mut list = Vec::new();
        while !matches!(
            self.tok,
            Token::Case | Token::Default | Token::Rbrace | Token::Eof
        ) {
            list.push(self.parse_stmt()?);
        }
        Ok(list)
    }

    /// A function body: the block scope is the function's scope (it
    /// holds the parameters), plus a fresh label scope.
    pub(crate) fn parse_body(&mut self, scope: ScopeId) -> PResult<StmtId> {
        let lbrace = self.expect(Token::Lbrace)?;
        self.top_scope = Some(scope);
        self.open_label_scope();
        let list = self.parse_stmt_list()?;
        self.close_label_scope()?;
        self.close_scope();
        let rbrace = self.expect(Token::Rbrace)?;
        Ok(self.arena.alloc_stmt(Stmt::Block {
            lbrace,
            list,
            rbrace,
        }))
    }

    pub(crate) fn parse_block_stmt(&mut self) -> PResult<StmtId> {
        let lbrace = self.expect(Token::Lbrace)?;
        self.open_scope();
        let list = self.parse_stmt_list()?;
        self.close_scope();
        let rbrace = self.expect(Token::Rbrace)?;
        Ok(self.arena.alloc_stmt(Stmt::Block {
            lbrace,
            list,
            rbrace,
        }))
    }

    fn parse_if_stmt(&mut self) -> PResult<StmtId> {
        let pos = self.expect(Token::If)?;
        self.open_scope();

        let mut init = None;
        let cond;
        {
            let prev_lev = self.expr_lev;
            self.expr_lev = -1;
            if self.tok == Token::Semicolon {
                self.next();
                cond = self.parse_rhs()?;
            } else {
                let (s, _) = self.parse_simple_stmt(SimpleMode::Basic)?;
                if self.tok == Token::Semicolon {
                    self.next();
                    init = Some(s);
                    cond = self.parse_rhs()?;
                } else {
                    cond = self.make_expr(s, "boolean expression")?;
                }
            }
            self.expr_lev = prev_lev;
        }

        let body = self.parse_block_stmt()?;
        let else_branch = if self.tok == Token::Else {
            self.next();
            Some(self.parse_stmt()?)
        } else {
            self.expect_semi()?;
            None
        };
        self.close_scope();
        Ok(self.arena.alloc_stmt(Stmt::If {
            if_pos: pos,
            init,
            cond,
            body,
            else_branch,
        }))
    }

    fn parse_type_list(&mut self) -> PResult<Vec<ExprId>> {
        let mut list = vec![self.parse_type()?];
        while self.tok == Token::Comma {
            self.next();
            list.push(self.parse_type()?);
        }
        Ok(list)
    }

    fn parse_case_clause(&mut self, type_switch: bool) -> PResult<StmtId> {
        let pos = self.pos;
        let list = if self.tok == Token::Case {
            self.next();
            if type_switch {
                self.parse_type_list()?
            } else {
                self.parse_rhs_list()?
            }
        } else {
            self.expect(Token::Default)?;
            Vec::new()
        };
        let colon = self.expect(Token::Colon)?;
        self.open_scope();
        let body = self.parse_stmt_list()?;
        self.close_scope();
        Ok(self.arena.alloc_stmt(Stmt::CaseClause {
            case: pos,
            list,
            colon,
            body,
        }))
    }

    fn is_type_switch_assert(&self, x: ExprId) -> bool {
        matches!(self.arena.expr(x), Expr::TypeAssert { typ: None, .. })
    }

    fn is_type_switch_guard(&self, s: Option<StmtId>) -> bool {
        match s.map(|s| self.arena.stmt(s)) {
            Some(Stmt::Expr(x)) => self.is_type_switch_assert(*x),
            Some(Stmt::Assign { lhs, op, rhs, .. }) => {
                lhs.len() == 1
                    && *op == Token::Define
                    && rhs.len() == 1
                    && self.is_type_switch_assert(rhs[0])
            }
            _ => false,
        }
    }

    fn parse_switch_stmt(&mut self) -> PResult<StmtId> {
        let pos = self.expect(Token::Switch)?;
        self.open_scope();

        let mut s1 = None;
        let mut s2 = None;
        let mut extra_scope = false;
        if self.tok != Token::Lbrace {
            let prev_lev = self.expr_lev;
            self.expr_lev = -1;
            if self.tok != Token::Semicolon {
                s2 = Some(self.parse_simple_stmt(SimpleMode::Basic)?.0);
            }
            if self.tok == Token::Semicolon {
                self.next();
                s1 = s2.take();
                if self.tok != Token::Lbrace {
                    // A type switch guard may declare a variable on top
                    // of one declared by the init statement; an extra
                    // scope keeps the redeclaration check out of it:
                    //   switch t := 0; t := x.(T) { ... }
                    self.open_scope();
                    extra_scope = true;
                    s2 = Some(self.parse_simple_stmt(SimpleMode::Basic)?.0);
                }
            }
            self.expr_lev = prev_lev;
        }

        let type_switch = self.is_type_switch_guard(s2);
        let lbrace = self.expect(Token::Lbrace)?;
        let mut list = Vec::new();
        while self.tok == Token::Case || self.tok == Token::Default {
            list.push(self.parse_case_clause(type_switch)?);
        }
        let rbrace = self.expect(Token::Rbrace)?;
        self.expect_semi()?;
        let body = self.arena.alloc_stmt(Stmt::Block {
            lbrace,
            list,
            rbrace,
        });

        if extra_scope {
            self.close_scope();
        }
        self.close_scope();

        if type_switch {
            let assign = match s2 {
                Some(s) => s,
                None => unreachable!("type switch guard without statement"),
            };
            return Ok(self.arena.alloc_stmt(Stmt::TypeSwitch {
                switch: pos,
                init: s1,
                assign,
                body,
            }));
        }
        let tag = match s2 {
            Some(s) => Some(self.make_expr(s, "switch expression")?),
            None => None,
        };
        Ok(self.arena.alloc_stmt(Stmt::Switch {
            switch: pos,
            init: s1,
            tag,
            body,
        }))
    }

    fn parse_comm_clause(&mut self) -> PResult<StmtId> {
        self.open_scope();
        let pos = self.pos;
        let mut comm = None;
        if self.tok == Token::Case {
            self.next();
            let mut lhs = self.parse_lhs_list()?;
            if self.tok == Token::Arrow {
                // Send statement.
                if lhs.len() > 1 {
                    let p = self.arena.expr_pos(lhs[0]);
                    self.error_expected(p, "1 expression")?;
                    // Continue with the first expression.
                }
                let arrow = self.pos;
                self.next();
                let value = self.parse_rhs()?;
                comm = Some(self.arena.alloc_stmt(Stmt::Send {
                    chan: lhs[0],
                    arrow,
                    value,
                }));
            } else if self.tok == Token::Assign || self.tok == Token::Define {
                // Receive with assignment.
                if lhs.len() > 2 {
                    let p = self.arena.expr_pos(lhs[0]);
                    self.error_expected(p, "1 or 2 expressions")?;
                    lhs.truncate(2);
                }
                let (tok_pos, tok) = (self.pos, self.tok);
                self.next();
                let rhs = self.parse_rhs()?;
                let s = self.arena.alloc_stmt(Stmt::Assign {
                    lhs: lhs.clone(),
                    tok_pos,
                    op: tok,
                    rhs: vec![rhs],
                });
                if tok == Token::Define {
                    self.short_var_decl(DeclRef::Stmt(s), &lhs)?;
                }
                comm = Some(s);
            } else {
                // Bare receive operation.
                if lhs.len() > 1 {
                    let p = self.arena.expr_pos(lhs[0]);
                    self.error_expected(p, "1 expression")?;
                }
                // parse_lhs_list deferred resolution on a lone
                // identifier before ':'.
                self.resolve(lhs[0]);
                comm = Some(self.arena.alloc_stmt(Stmt::Expr(lhs[0])));
            }
        } else {
            self.expect(Token::Default)?;
        }
        let colon = self.expect(Token::Colon)?;
        let body = self.parse_stmt_list()?;
        self.close_scope();
        Ok(self.arena.alloc_stmt(Stmt::CommClause {
            case: pos,
            comm,
            colon,
            body,
        }))
    }

    fn parse_select_stmt(&mut self) -> PResult<StmtId> {
        let pos = self.expect(Token::Select)?;
        let lbrace = self.expect(Token::Lbrace)?;
        let mut list = Vec::new();
        while self.tok == Token::Case || self.tok == Token::Default {
            list.push(self.parse_comm_clause()?);
        }
        let rbrace = self.expect(Token::Rbrace)?;
        self.expect_semi()?;
        let body = self.arena.alloc_stmt(Stmt::Block {
            lbrace,
            list,
            rbrace,
        });
        Ok(self.arena.alloc_stmt(Stmt::Select { select: pos, body }))
    }

    fn parse_for_stmt(&mut self) -> PResult<StmtId> {
        let pos = self.expect(Token::For)?;
        self.open_scope();

        let mut s1 = None;
        let mut s2 = None;
        let mut s3 = None;
        let mut is_range = false;
        if self.tok != Token::Lbrace {
            let prev_lev = self.expr_lev;
            self.expr_lev = -1;
            if self.tok != Token::Semicolon {
                if self.tok == Token::Range {
                    // "for range x": no left-hand side at all.
                    self.next();
                    let rhs = self.parse_rhs()?;
                    s2 = Some(self.arena.alloc_stmt(Stmt::Assign {
                        lhs: Vec::new(),
                        tok_pos: Pos::NONE,
                        op: Token::Illegal,
                        rhs: vec![rhs],
                    }));
                    is_range = true;
                } else {
                    let (s, r) = self.parse_simple_stmt(SimpleMode::RangeOk)?;
                    s2 = Some(s);
                    is_range = r;
                }
            }
            if !is_range && self.tok == Token::Semicolon {
                self.next();
                s1 = s2.take();
                if self.tok != Token::Semicolon {
                    s2 = Some(self.parse_simple_stmt(SimpleMode::Basic)?.0);
                }
                self.expect_semi()?;
                if self.tok != Token::Lbrace {
                    s3 = Some(self.parse_simple_stmt(SimpleMode::Basic)?.0);
                }
            }
            self.expr_lev = prev_lev;
        }

        let body = self.parse_block_stmt()?;
        self.expect_semi()?;
        self.close_scope();

        if is_range {
            let assign = match s2 {
                Some(s) => s,
                None => unreachable!("range clause without assignment"),
            };
            let (lhs, tok_pos, tok, x) = match self.arena.stmt(assign) {
                Stmt::Assign {
                    lhs,
                    tok_pos,
                    op,
                    rhs,
                } => (lhs.clone(), *tok_pos, *op, rhs[0]),
                _ => unreachable!("range clause without assignment"),
            };
            let (key, value) = match lhs.len() {
                0 => (None, None),
                1 => (Some(lhs[0]), None),
                2 => (Some(lhs[0]), Some(lhs[1])),
                _ => {
                    let p = self.arena.expr_pos(lhs[lhs.len() - 1]);
                    self.error_expected(p, "at most 2 expressions")?;
                    let to = self.safe_pos(self.arena.stmt_end(&self.interner, body));
                    return Ok(self.arena.alloc_stmt(Stmt::Bad { from: pos, to }));
                }
            };
            return Ok(self.arena.alloc_stmt(Stmt::Range {
                for_pos: pos,
                key,
                value,
                tok_pos,
                tok,
                expr: x,
                body,
            }));
        }

        let cond = match s2 {
            Some(s) => Some(self.make_expr(s, "boolean or range expression")?),
            None => None,
        };
        Ok(self.arena.alloc_stmt(Stmt::For {
            for_pos: pos,
            init: s1,
            cond,
            post: s3,
            body,
        }))
    }
}
