//! Depth-first traversal over the syntax arena.
//!
//! [`Visitor::visit`] is called before a node's children and may prune
//! the subtree by returning `false`; [`Visitor::leave`] is called after
//! the children. Children are visited in source order, matching the
//! order the parser allocated them.

use crate::ast::{
    Arena, Decl, DeclId, Expr, ExprId, FieldId, FieldList, FileNode, Spec, SpecId, Stmt, StmtId,
};

/// A node reference handed to the visitor.
#[derive(Copy, Clone, Debug)]
pub enum Node<'a> {
    File(&'a FileNode),
    Expr(ExprId),
    Stmt(StmtId),
    Decl(DeclId),
    Spec(SpecId),
    Field(FieldId),
}

/// Depth-first syntax visitor.
pub trait Visitor {
    /// Pre-order hook; return `false` to skip the node's children.
    fn visit(&mut self, arena: &Arena, node: Node<'_>) -> bool;

    /// Post-order hook.
    fn leave(&mut self, _arena: &Arena, _node: Node<'_>) {}
}

/// Walk a whole file: package name, then declarations.
pub fn walk_file<V: Visitor>(visitor: &mut V, arena: &Arena, file: &FileNode) {
    if visitor.visit(arena, Node::File(file)) {
        walk_expr(visitor, arena, file.name);
        for &decl in &file.decls {
            walk_decl(visitor, arena, decl);
        }
    }
    visitor.leave(arena, Node::File(file));
}

pub fn walk_expr<V: Visitor>(visitor: &mut V, arena: &Arena, id: ExprId) {
    if visitor.visit(arena, Node::Expr(id)) {
        match arena.expr(id) {
            Expr::Bad { .. } | Expr::Ident { .. } | Expr::BasicLit { .. } => {}
            Expr::Ellipsis { elt, .. } => walk_opt_expr(visitor, arena, *elt),
            Expr::FuncLit { typ, body } => {
                walk_expr(visitor, arena, *typ);
                walk_stmt(visitor, arena, *body);
            }
            Expr::CompositeLit { typ, elts, .. } => {
                walk_opt_expr(visitor, arena, *typ);
                walk_exprs(visitor, arena, elts);
            }
            Expr::Paren { expr, .. } | Expr::Star { expr, .. } | Expr::Unary { expr, .. } => {
                walk_expr(visitor, arena, *expr);
            }
            Expr::Selector { expr, sel } => {
                walk_expr(visitor, arena, *expr);
                walk_expr(visitor, arena, *sel);
            }
            Expr::Index { expr, index, .. } => {
                walk_expr(visitor, arena, *expr);
                walk_expr(visitor, arena, *index);
            }
            Expr::Slice {
                expr,
                low,
                high,
                max,
                ..
            } => {
                walk_expr(visitor, arena, *expr);
                walk_opt_expr(visitor, arena, *low);
                walk_opt_expr(visitor, arena, *high);
                walk_opt_expr(visitor, arena, *max);
            }
            Expr::TypeAssert { expr, typ, .. } => {
                walk_expr(visitor, arena, *expr);
                walk_opt_expr(visitor, arena, *typ);
            }
            Expr::Call { fun, args, .. } => {
                walk_expr(visitor, arena, *fun);
                walk_exprs(visitor, arena, args);
            }
            Expr::Binary { x, y, .. } => {
                walk_expr(visitor, arena, *x);
                walk_expr(visitor, arena, *y);
            }
            Expr::KeyValue { key, value, .. } => {
                walk_expr(visitor, arena, *key);
                walk_expr(visitor, arena, *value);
            }
            Expr::ArrayType { len, elt, .. } => {
                walk_opt_expr(visitor, arena, *len);
                walk_expr(visitor, arena, *elt);
            }
            Expr::StructType { fields, .. } => walk_field_list(visitor, arena, fields),
            Expr::FuncType {
                params, results, ..
            } => {
                walk_field_list(visitor, arena, params);
                if let Some(results) = results {
                    walk_field_list(visitor, arena, results);
                }
            }
            Expr::InterfaceType { methods, .. } => walk_field_list(visitor, arena, methods),
            Expr::MapType { key, value, .. } => {
                walk_expr(visitor, arena, *key);
                walk_expr(visitor, arena, *value);
            }
            Expr::ChanType { value, .. } => walk_expr(visitor, arena, *value),
        }
    }
    visitor.leave(arena, Node::Expr(id));
}

pub fn walk_stmt<V: Visitor>(visitor: &mut V, arena: &Arena, id: StmtId) {
    if visitor.visit(arena, Node::Stmt(id)) {
        match arena.stmt(id) {
            Stmt::Bad { .. } | Stmt::Empty { .. } => {}
            Stmt::Decl(d) => walk_decl(visitor, arena, *d),
            Stmt::Labeled { label, stmt, .. } => {
                walk_expr(visitor, arena, *label);
                walk_stmt(visitor, arena, *stmt);
            }
            Stmt::Expr(x) => walk_expr(visitor, arena, *x),
            Stmt::Send { chan, value, .. } => {
                walk_expr(visitor, arena, *chan);
                walk_expr(visitor, arena, *value);
            }
            Stmt::IncDec { expr, .. } => walk_expr(visitor, arena, *expr),
            Stmt::Assign { lhs, rhs, .. } => {
                walk_exprs(visitor, arena, lhs);
                walk_exprs(visitor, arena, rhs);
            }
            Stmt::Go { call, .. } | Stmt::Defer { call, .. } => walk_expr(visitor, arena, *call),
            Stmt::Return { results, .. } => walk_exprs(visitor, arena, results),
            Stmt::Branch { label, .. } => walk_opt_expr(visitor, arena, *label),
            Stmt::Block { list, .. } => {
                for &stmt in list {
                    walk_stmt(visitor, arena, stmt);
                }
            }
            Stmt::If {
                init,
                cond,
                body,
                else_branch,
                ..
            } => {
                walk_opt_stmt(visitor, arena, *init);
                walk_expr(visitor, arena, *cond);
                walk_stmt(visitor, arena, *body);
                walk_opt_stmt(visitor, arena, *else_branch);
            }
            Stmt::CaseClause { list, body, .. } => {
                walk_exprs(visitor, arena, list);
                for &stmt in body {
                    walk_stmt(visitor, arena, stmt);
                }
            }
            Stmt::Switch {
                init, tag, body, ..
            } => {
                walk_opt_stmt(visitor, arena, *init);
                walk_opt_expr(visitor, arena, *tag);
                walk_stmt(visitor, arena, *body);
            }
            Stmt::TypeSwitch {
                init, assign, body, ..
            } => {
                walk_opt_stmt(visitor, arena, *init);
                walk_stmt(visitor, arena, *assign);
                walk_stmt(visitor, arena, *body);
            }
            Stmt::CommClause { comm, body, .. } => {
                walk_opt_stmt(visitor, arena, *comm);
                for &stmt in body {
                    walk_stmt(visitor, arena, stmt);
                }
            }
            Stmt::Select { body, .. } => walk_stmt(visitor, arena, *body),
            Stmt::For {
                init,
                cond,
                post,
                body,
                ..
            } => {
                walk_opt_stmt(visitor, arena, *init);
                walk_opt_expr(visitor, arena, *cond);
                walk_opt_stmt(visitor, arena, *post);
                walk_stmt(visitor, arena, *body);
            }
            Stmt::Range {
                key,
                value,
                expr,
                body,
                ..
            } => {
                walk_opt_expr(visitor, arena, *key);
                walk_opt_expr(visitor, arena, *value);
                walk_expr(visitor, arena, *expr);
                walk_stmt(visitor, arena, *body);
            }
        }
    }
    visitor.leave(arena, Node::Stmt(id));
}

pub fn walk_decl<V: Visitor>(visitor: &mut V, arena: &Arena, id: DeclId) {
    if visitor.visit(arena, Node::Decl(id)) {
        match arena.decl(id) {
            Decl::Bad { .. } => {}
            Decl::Gen { specs, .. } => {
                for &spec in specs {
                    walk_spec(visitor, arena, spec);
                }
            }
            Decl::Func {
                recv,
                name,
                typ,
                body,
                ..
            } => {
                if let Some(recv) = recv {
                    walk_field_list(visitor, arena, recv);
                }
                walk_expr(visitor, arena, *name);
                walk_expr(visitor, arena, *typ);
                walk_opt_stmt(visitor, arena, *body);
            }
        }
    }
    visitor.leave(arena, Node::Decl(id));
}

pub fn walk_spec<V: Visitor>(visitor: &mut V, arena: &Arena, id: SpecId) {
    if visitor.visit(arena, Node::Spec(id)) {
        match arena.spec(id) {
            Spec::Import { name, path, .. } => {
                walk_opt_expr(visitor, arena, *name);
                walk_expr(visitor, arena, *path);
            }
            Spec::Value {
                names, typ, values, ..
            } => {
                walk_exprs(visitor, arena, names);
                walk_opt_expr(visitor, arena, *typ);
                walk_exprs(visitor, arena, values);
            }
            Spec::Type { name, typ, .. } => {
                walk_expr(visitor, arena, *name);
                walk_expr(visitor, arena, *typ);
            }
        }
    }
    visitor.leave(arena, Node::Spec(id));
}

pub fn walk_field<V: Visitor>(visitor: &mut V, arena: &Arena, id: FieldId) {
    if visitor.visit(arena, Node::Field(id)) {
        let field = arena.field(id);
        walk_exprs(visitor, arena, &field.names);
        walk_expr(visitor, arena, field.typ);
        walk_opt_expr(visitor, arena, field.tag);
    }
    visitor.leave(arena, Node::Field(id));
}

fn walk_field_list<V: Visitor>(visitor: &mut V, arena: &Arena, list: &FieldList) {
    for &field in &list.list {
        walk_field(visitor, arena, field);
    }
}

fn walk_exprs<V: Visitor>(visitor: &mut V, arena: &Arena, list: &[ExprId]) {
    for &expr in list {
        walk_expr(visitor, arena, expr);
    }
}

fn walk_opt_expr<V: Visitor>(visitor: &mut V, arena: &Arena, expr: Option<ExprId>) {
    if let Some(expr) = expr {
        walk_expr(visitor, arena, expr);
    }
}

fn walk_opt_stmt<V: Visitor>(visitor: &mut V, arena: &Arena, stmt: Option<StmtId>) {
    if let Some(stmt) = stmt {
        walk_stmt(visitor, arena, stmt);
    }
}

struct Inspector<F>(F);

impl<F> Visitor for Inspector<F>
where
    F: FnMut(&Arena, Node<'_>) -> bool,
{
    fn visit(&mut self, arena: &Arena, node: Node<'_>) -> bool {
        (self.0)(arena, node)
    }
}

/// Traverse a file with a closure instead of a full [`Visitor`].
///
/// The closure's return value prunes subtrees exactly like
/// [`Visitor::visit`].
pub fn inspect<F>(arena: &Arena, file: &FileNode, f: F)
where
    F: FnMut(&Arena, Node<'_>) -> bool,
{
    walk_file(&mut Inspector(f), arena, file);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;
    use crate::interner::StringInterner;
    use crate::pos::Pos;
    use crate::scope::ScopeData;
    use crate::token::Token;

    fn sample_file(arena: &mut Arena, interner: &StringInterner) -> FileNode {
        // package p
        // func f() { g(1 + 2) }
        let pkg_name = arena.alloc_expr(Expr::Ident {
            pos: Pos(9),
            name: interner.intern("p"),
            entity: None,
        });
        let f_name = arena.alloc_expr(Expr::Ident {
            pos: Pos(16),
            name: interner.intern("f"),
            entity: None,
        });
        let f_typ = arena.alloc_expr(Expr::FuncType {
            pos: Pos(11),
            params: FieldList {
                opening: Pos(17),
                list: Vec::new(),
                closing: Pos(18),
            },
            results: None,
        });
        let g = arena.alloc_expr(Expr::Ident {
            pos: Pos(22),
            name: interner.intern("g"),
            entity: None,
        });
        let one = arena.alloc_expr(Expr::BasicLit {
            pos: Pos(24),
            kind: Token::Int,
            lit: interner.intern("1"),
        });
        let two = arena.alloc_expr(Expr::BasicLit {
            pos: Pos(28),
            kind: Token::Int,
            lit: interner.intern("2"),
        });
        let sum = arena.alloc_expr(Expr::Binary {
            x: one,
            op_pos: Pos(26),
            op: Token::Add,
            y: two,
        });
        let call = arena.alloc_expr(Expr::Call {
            fun: g,
            lparen: Pos(23),
            args: vec![sum],
            ellipsis: Pos::NONE,
            rparen: Pos(29),
        });
        let call_stmt = arena.alloc_stmt(Stmt::Expr(call));
        let body = arena.alloc_stmt(Stmt::Block {
            lbrace: Pos(20),
            list: vec![call_stmt],
            rbrace: Pos(31),
        });
        let decl = arena.alloc_decl(Decl::Func {
            doc: None,
            recv: None,
            name: f_name,
            typ: f_typ,
            body: Some(body),
        });
        let scope = arena.alloc_scope(ScopeData::new(None));
        FileNode {
            doc: None,
            package: Pos(1),
            name: pkg_name,
            decls: vec![decl],
            scope,
            imports: Vec::new(),
            unresolved: Vec::new(),
            comments: Vec::new(),
        }
    }

    #[test]
    fn inspect_reaches_every_expression() {
        let interner = StringInterner::new();
        let mut arena = Arena::new();
        let file = sample_file(&mut arena, &interner);

        let mut exprs = 0usize;
        inspect(&arena, &file, |_, node| {
            if matches!(node, Node::Expr(_)) {
                exprs += 1;
            }
            true
        });
        // pkg name, f, func type, g, 1, 2, 1+2, call.
        assert_eq!(exprs, 8);
    }

    #[test]
    fn returning_false_prunes_children() {
        let interner = StringInterner::new();
        let mut arena = Arena::new();
        let file = sample_file(&mut arena, &interner);

        let mut exprs = 0usize;
        inspect(&arena, &file, |arena, node| {
            if let Node::Expr(id) = node {
                exprs += 1;
                // Skip the operands of the call.
                return !matches!(arena.expr(id), Expr::Call { .. });
            }
            true
        });
        // pkg name, f, func type, call. Pruning hides g, 1, 2, 1+2.
        assert_eq!(exprs, 4);
    }

    #[test]
    fn leave_mirrors_visit() {
        struct Balance {
            depth: i32,
            max_depth: i32,
        }
        impl Visitor for Balance {
            fn visit(&mut self, _: &Arena, _: Node<'_>) -> bool {
                self.depth += 1;
                self.max_depth = self.max_depth.max(self.depth);
                true
            }
            fn leave(&mut self, _: &Arena, _: Node<'_>) {
                self.depth -= 1;
            }
        }

        let interner = StringInterner::new();
        let mut arena = Arena::new();
        let file = sample_file(&mut arena, &interner);

        let mut v = Balance {
            depth: 0,
            max_depth: 0,
        };
        walk_file(&mut v, &arena, &file);
        assert_eq!(v.depth, 0);
        assert!(v.max_depth >= 5);
    }
}
