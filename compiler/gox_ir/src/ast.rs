//! Arena-allocated syntax nodes.
//!
//! Nodes never own each other: every cross-reference is a typed `u32`
//! index into the [`Arena`], so the whole syntax tree for a file is a
//! handful of contiguous vectors. Children always precede their parents
//! in allocation order, which the walker relies on.
//!
//! Source extents are recovered on demand: `pos` methods need only the
//! arena, `end` methods additionally take the interner because the end
//! of an identifier or literal is its start plus the text length.

use crate::comment::CommentGroup;
use crate::interner::StringInterner;
use crate::name::Name;
use crate::pos::Pos;
use crate::scope::{Entity, EntityId, ScopeData, ScopeId};
use crate::token::Token;
use std::fmt;

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

arena_id!(
    /// Index of an [`Expr`] in the arena.
    ExprId
);
arena_id!(
    /// Index of a [`Stmt`] in the arena.
    StmtId
);
arena_id!(
    /// Index of a [`Decl`] in the arena.
    DeclId
);
arena_id!(
    /// Index of a [`Spec`] in the arena.
    SpecId
);
arena_id!(
    /// Index of a [`Field`] in the arena.
    FieldId
);
arena_id!(
    /// Index of a [`CommentGroup`] in the arena.
    CommentId
);

/// Direction of a channel type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ChanDir {
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
    /// `chan T`
    Both,
}

/// Expression and type nodes.
///
/// Types are expressions here: the parser cannot always distinguish the
/// two without name resolution, so `ArrayType`, `MapType` and friends
/// share the expression arena.
#[derive(Clone, Debug)]
pub enum Expr {
    /// Placeholder for a badly formed expression.
    Bad { from: Pos, to: Pos },
    Ident {
        pos: Pos,
        name: Name,
        /// Entity this identifier denotes, filled in during resolution.
        entity: Option<EntityId>,
    },
    /// `...` or `...T` in parameter lists and array types.
    Ellipsis { pos: Pos, elt: Option<ExprId> },
    /// Literal of kind `Int`, `Float`, `Imag`, `Char`, or `String`.
    BasicLit { pos: Pos, kind: Token, lit: Name },
    FuncLit { typ: ExprId, body: StmtId },
    CompositeLit {
        /// Absent for nested literals with elided types.
        typ: Option<ExprId>,
        lbrace: Pos,
        elts: Vec<ExprId>,
        rbrace: Pos,
    },
    Paren { lparen: Pos, expr: ExprId, rparen: Pos },
    Selector { expr: ExprId, sel: ExprId },
    Index {
        expr: ExprId,
        lbrack: Pos,
        index: ExprId,
        rbrack: Pos,
    },
    Slice {
        expr: ExprId,
        lbrack: Pos,
        low: Option<ExprId>,
        high: Option<ExprId>,
        max: Option<ExprId>,
        /// `true` for 3-index slices; `max` must then be present.
        slice3: bool,
        rbrack: Pos,
    },
    /// `x.(T)`; `typ` is `None` for the `x.(type)` form in type switches.
    TypeAssert {
        expr: ExprId,
        lparen: Pos,
        typ: Option<ExprId>,
        rparen: Pos,
    },
    Call {
        fun: ExprId,
        lparen: Pos,
        args: Vec<ExprId>,
        /// Position of `...` after the last argument, or [`Pos::NONE`].
        ellipsis: Pos,
        rparen: Pos,
    },
    /// `*x`: pointer type or dereference.
    Star { star: Pos, expr: ExprId },
    Unary { pos: Pos, op: Token, expr: ExprId },
    Binary {
        x: ExprId,
        op_pos: Pos,
        op: Token,
        y: ExprId,
    },
    KeyValue { key: ExprId, colon: Pos, value: ExprId },
    ArrayType {
        lbrack: Pos,
        /// `None` for slice types; an [`Expr::Ellipsis`] for `[...]T`.
        len: Option<ExprId>,
        elt: ExprId,
    },
    StructType {
        pos: Pos,
        fields: FieldList,
        /// `true` if fields were dropped due to parse errors.
        incomplete: bool,
    },
    FuncType {
        /// Position of `func`, or [`Pos::NONE`] inside method signatures.
        pos: Pos,
        params: FieldList,
        results: Option<FieldList>,
    },
    InterfaceType {
        pos: Pos,
        methods: FieldList,
        incomplete: bool,
    },
    MapType { pos: Pos, key: ExprId, value: ExprId },
    ChanType {
        /// Position of `chan` or, for `<-chan`, of `<-`.
        begin: Pos,
        /// Position of `<-`, or [`Pos::NONE`].
        arrow: Pos,
        dir: ChanDir,
        value: ExprId,
    },
}

/// Statement nodes.
#[derive(Clone, Debug)]
pub enum Stmt {
    Bad { from: Pos, to: Pos },
    Decl(DeclId),
    Empty {
        semicolon: Pos,
        /// `true` when the semicolon was inserted, not written.
        implicit: bool,
    },
    Labeled { label: ExprId, colon: Pos, stmt: StmtId },
    Expr(ExprId),
    Send { chan: ExprId, arrow: Pos, value: ExprId },
    IncDec { expr: ExprId, tok_pos: Pos, op: Token },
    Assign {
        lhs: Vec<ExprId>,
        tok_pos: Pos,
        /// `Assign`, `Define`, or one of the compound-assignment tokens.
        op: Token,
        rhs: Vec<ExprId>,
    },
    Go { go: Pos, call: ExprId },
    Defer { defer_pos: Pos, call: ExprId },
    Return { return_pos: Pos, results: Vec<ExprId> },
    /// `break`, `continue`, `goto`, or `fallthrough`.
    Branch {
        pos: Pos,
        op: Token,
        label: Option<ExprId>,
    },
    Block { lbrace: Pos, list: Vec<StmtId>, rbrace: Pos },
    If {
        if_pos: Pos,
        init: Option<StmtId>,
        cond: ExprId,
        body: StmtId,
        else_branch: Option<StmtId>,
    },
    /// `case x, y:` or `default:` in an expression or type switch.
    CaseClause {
        case: Pos,
        /// Empty for `default`.
        list: Vec<ExprId>,
        colon: Pos,
        body: Vec<StmtId>,
    },
    Switch {
        switch: Pos,
        init: Option<StmtId>,
        tag: Option<ExprId>,
        body: StmtId,
    },
    TypeSwitch {
        switch: Pos,
        init: Option<StmtId>,
        /// The `x := y.(type)` or `y.(type)` statement.
        assign: StmtId,
        body: StmtId,
    },
    /// `case ch <- x:`, `case x := <-ch:`, or `default:` in a select.
    CommClause {
        case: Pos,
        comm: Option<StmtId>,
        colon: Pos,
        body: Vec<StmtId>,
    },
    Select { select: Pos, body: StmtId },
    For {
        for_pos: Pos,
        init: Option<StmtId>,
        cond: Option<ExprId>,
        post: Option<StmtId>,
        body: StmtId,
    },
    Range {
        for_pos: Pos,
        key: Option<ExprId>,
        value: Option<ExprId>,
        /// Position and kind (`Assign` or `Define`) of the token before
        /// `range`; [`Pos::NONE`] and `Illegal` for a bare `for range x`.
        tok_pos: Pos,
        tok: Token,
        expr: ExprId,
        body: StmtId,
    },
}

/// Declaration nodes.
#[derive(Clone, Debug)]
pub enum Decl {
    Bad { from: Pos, to: Pos },
    /// `import`, `const`, `type`, or `var`, possibly parenthesized.
    Gen {
        doc: Option<CommentId>,
        tok_pos: Pos,
        tok: Token,
        /// [`Pos::NONE`] when there are no parentheses.
        lparen: Pos,
        specs: Vec<SpecId>,
        rparen: Pos,
    },
    Func {
        doc: Option<CommentId>,
        recv: Option<FieldList>,
        name: ExprId,
        /// The [`Expr::FuncType`] carrying parameters and results.
        typ: ExprId,
        /// Absent for forward declarations.
        body: Option<StmtId>,
    },
}

/// One item of a generic declaration.
#[derive(Clone, Debug)]
pub enum Spec {
    Import {
        doc: Option<CommentId>,
        /// Local name: `.`, `_`, or an identifier.
        name: Option<ExprId>,
        /// The import path string literal.
        path: ExprId,
        comment: Option<CommentId>,
        /// End of the spec, when it differs from the path's end.
        end_pos: Pos,
    },
    /// A `const` or `var` line.
    Value {
        doc: Option<CommentId>,
        names: Vec<ExprId>,
        typ: Option<ExprId>,
        values: Vec<ExprId>,
        comment: Option<CommentId>,
    },
    Type {
        doc: Option<CommentId>,
        name: ExprId,
        typ: ExprId,
        comment: Option<CommentId>,
    },
}

/// A field declaration in a struct type, method list, or signature.
#[derive(Clone, Debug)]
pub struct Field {
    pub doc: Option<CommentId>,
    /// Empty for embedded fields and unnamed parameters.
    pub names: Vec<ExprId>,
    pub typ: ExprId,
    /// Struct field tag.
    pub tag: Option<ExprId>,
    pub comment: Option<CommentId>,
}

/// A brace- or paren-enclosed list of fields.
#[derive(Clone, Debug)]
pub struct FieldList {
    /// Opening delimiter, or [`Pos::NONE`] (unparenthesized results).
    pub opening: Pos,
    pub list: Vec<FieldId>,
    pub closing: Pos,
}

impl FieldList {
    /// Total number of declared names; an unnamed field counts as one.
    pub fn num_fields(&self, arena: &Arena) -> usize {
        self.list
            .iter()
            .map(|&id| arena.field(id).names.len().max(1))
            .sum()
    }
}

/// A parsed source file.
#[derive(Clone, Debug)]
pub struct FileNode {
    pub doc: Option<CommentId>,
    /// Position of the `package` keyword.
    pub package: Pos,
    pub name: ExprId,
    pub decls: Vec<DeclId>,
    /// The file-level scope (package-level declarations of this file).
    pub scope: ScopeId,
    pub imports: Vec<SpecId>,
    /// Identifiers that resolved to nothing within the file, in order of
    /// appearance. Candidates for package- or universe-level resolution.
    pub unresolved: Vec<ExprId>,
    /// All comment groups, in source order.
    pub comments: Vec<CommentId>,
}

impl FileNode {
    pub fn pos(&self) -> Pos {
        self.package
    }

    pub fn end(&self, arena: &Arena, interner: &StringInterner) -> Pos {
        self.decls.last().map_or_else(
            || arena.expr_end(interner, self.name),
            |&d| arena.decl_end(interner, d),
        )
    }
}

/// Backing store for one file's syntax tree.
///
/// # Invariant
///
/// Ids handed out by the `alloc_*` methods are only valid for the arena
/// that produced them; indexing with a foreign id is a logic error and
/// panics at worst.
#[derive(Default, Debug)]
pub struct Arena {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    decls: Vec<Decl>,
    specs: Vec<Spec>,
    fields: Vec<Field>,
    entities: Vec<Entity>,
    scopes: Vec<ScopeData>,
    comments: Vec<CommentGroup>,
}

impl Arena {
    pub fn new() -> Self {
        Arena::default()
    }

    /// Pre-size the expression vector from the source length. The other
    /// vectors grow organically; expressions dominate.
    pub fn with_capacity(source_len: usize) -> Self {
        Arena {
            exprs: Vec::with_capacity(source_len / 16),
            ..Arena::default()
        }
    }

    fn bump<T>(vec: &mut Vec<T>, value: T, what: &str) -> u32 {
        let index = u32::try_from(vec.len())
            .unwrap_or_else(|_| panic!("arena overflow: more than u32::MAX {what}"));
        vec.push(value);
        index
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        ExprId::new(Self::bump(&mut self.exprs, expr, "expressions"))
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        StmtId::new(Self::bump(&mut self.stmts, stmt, "statements"))
    }

    pub fn alloc_decl(&mut self, decl: Decl) -> DeclId {
        DeclId::new(Self::bump(&mut self.decls, decl, "declarations"))
    }

    pub fn alloc_spec(&mut self, spec: Spec) -> SpecId {
        SpecId::new(Self::bump(&mut self.specs, spec, "specs"))
    }

    pub fn alloc_field(&mut self, field: Field) -> FieldId {
        FieldId::new(Self::bump(&mut self.fields, field, "fields"))
    }

    pub fn alloc_entity(&mut self, entity: Entity) -> EntityId {
        EntityId(Self::bump(&mut self.entities, entity, "entities"))
    }

    pub fn alloc_scope(&mut self, scope: ScopeData) -> ScopeId {
        ScopeId(Self::bump(&mut self.scopes, scope, "scopes"))
    }

    pub fn alloc_comment(&mut self, group: CommentGroup) -> CommentId {
        CommentId::new(Self::bump(&mut self.comments, group, "comment groups"))
    }

    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.index()]
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    #[inline]
    pub fn stmt_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.stmts[id.index()]
    }

    #[inline]
    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    #[inline]
    pub fn spec(&self, id: SpecId) -> &Spec {
        &self.specs[id.index()]
    }

    #[inline]
    pub fn spec_mut(&mut self, id: SpecId) -> &mut Spec {
        &mut self.specs[id.index()]
    }

    #[inline]
    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.index()]
    }

    #[inline]
    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0 as usize]
    }

    #[inline]
    pub fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.0 as usize]
    }

    #[inline]
    pub fn scope(&self, id: ScopeId) -> &ScopeData {
        &self.scopes[id.0 as usize]
    }

    #[inline]
    pub fn scope_mut(&mut self, id: ScopeId) -> &mut ScopeData {
        &mut self.scopes[id.0 as usize]
    }

    #[inline]
    pub fn comment(&self, id: CommentId) -> &CommentGroup {
        &self.comments[id.index()]
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    /// Look `name` up through the scope chain starting at `scope`.
    pub fn resolve_in_chain(&self, mut scope: Option<ScopeId>, name: Name) -> Option<EntityId> {
        while let Some(id) = scope {
            let data = self.scope(id);
            if let Some(entity) = data.lookup(name) {
                return Some(entity);
            }
            scope = data.outer;
        }
        None
    }

    /// Start of the expression's source extent.
    pub fn expr_pos(&self, id: ExprId) -> Pos {
        match self.expr(id) {
            Expr::Bad { from, .. } => *from,
            Expr::Ident { pos, .. }
            | Expr::Ellipsis { pos, .. }
            | Expr::BasicLit { pos, .. }
            | Expr::StructType { pos, .. }
            | Expr::InterfaceType { pos, .. }
            | Expr::MapType { pos, .. }
            | Expr::Unary { pos, .. } => *pos,
            Expr::FuncLit { typ, .. } => self.expr_pos(*typ),
            Expr::CompositeLit { typ, lbrace, .. } => {
                typ.map_or(*lbrace, |t| self.expr_pos(t))
            }
            Expr::Paren { lparen, .. } => *lparen,
            Expr::Selector { expr, .. }
            | Expr::Index { expr, .. }
            | Expr::Slice { expr, .. }
            | Expr::TypeAssert { expr, .. } => self.expr_pos(*expr),
            Expr::Call { fun, .. } => self.expr_pos(*fun),
            Expr::Star { star, .. } => *star,
            Expr::Binary { x, .. } => self.expr_pos(*x),
            Expr::KeyValue { key, .. } => self.expr_pos(*key),
            Expr::ArrayType { lbrack, .. } => *lbrack,
            Expr::FuncType { pos, params, .. } => {
                if pos.is_valid() {
                    *pos
                } else {
                    self.field_list_pos(params)
                }
            }
            Expr::ChanType { begin, .. } => *begin,
        }
    }

    /// Position just past the expression's source extent.
    pub fn expr_end(&self, interner: &StringInterner, id: ExprId) -> Pos {
        match self.expr(id) {
            Expr::Bad { to, .. } => *to,
            Expr::Ident { pos, name, .. } => {
                Pos(pos.0 + interner.lookup(*name).len() as u32)
            }
            Expr::Ellipsis { pos, elt } => {
                elt.map_or(Pos(pos.0 + 3), |e| self.expr_end(interner, e))
            }
            Expr::BasicLit { pos, lit, .. } => {
                Pos(pos.0 + interner.lookup(*lit).len() as u32)
            }
            Expr::FuncLit { body, .. } => self.stmt_end(interner, *body),
            Expr::CompositeLit { rbrace, .. } => Pos(rbrace.0 + 1),
            Expr::Paren { rparen, .. } => Pos(rparen.0 + 1),
            Expr::Selector { sel, .. } => self.expr_end(interner, *sel),
            Expr::Index { rbrack, .. } | Expr::Slice { rbrack, .. } => Pos(rbrack.0 + 1),
            Expr::TypeAssert { rparen, .. } | Expr::Call { rparen, .. } => Pos(rparen.0 + 1),
            Expr::Star { expr, .. } | Expr::Unary { expr, .. } => self.expr_end(interner, *expr),
            Expr::Binary { y, .. } => self.expr_end(interner, *y),
            Expr::KeyValue { value, .. } => self.expr_end(interner, *value),
            Expr::ArrayType { elt, .. } => self.expr_end(interner, *elt),
            Expr::StructType { fields, .. } => self.field_list_end(interner, fields),
            Expr::FuncType { params, results, .. } => results
                .as_ref()
                .map_or_else(|| self.field_list_end(interner, params), |r| {
                    self.field_list_end(interner, r)
                }),
            Expr::InterfaceType { methods, .. } => self.field_list_end(interner, methods),
            Expr::MapType { value, .. } | Expr::ChanType { value, .. } => {
                self.expr_end(interner, *value)
            }
        }
    }

    pub fn stmt_pos(&self, id: StmtId) -> Pos {
        match self.stmt(id) {
            Stmt::Bad { from, .. } => *from,
            Stmt::Decl(d) => self.decl_pos(*d),
            Stmt::Empty { semicolon, .. } => *semicolon,
            Stmt::Labeled { label, .. } => self.expr_pos(*label),
            Stmt::Expr(x) => self.expr_pos(*x),
            Stmt::Send { chan, .. } => self.expr_pos(*chan),
            Stmt::IncDec { expr, .. } => self.expr_pos(*expr),
            Stmt::Assign { lhs, .. } => {
                lhs.first().map_or(Pos::NONE, |&x| self.expr_pos(x))
            }
            Stmt::Go { go, .. } => *go,
            Stmt::Defer { defer_pos, .. } => *defer_pos,
            Stmt::Return { return_pos, .. } => *return_pos,
            Stmt::Branch { pos, .. } => *pos,
            Stmt::Block { lbrace, .. } => *lbrace,
            Stmt::If { if_pos, .. } => *if_pos,
            Stmt::CaseClause { case, .. } | Stmt::CommClause { case, .. } => *case,
            Stmt::Switch { switch, .. } | Stmt::TypeSwitch { switch, .. } => *switch,
            Stmt::Select { select, .. } => *select,
            Stmt::For { for_pos, .. } | Stmt::Range { for_pos, .. } => *for_pos,
        }
    }

    pub fn stmt_end(&self, interner: &StringInterner, id: StmtId) -> Pos {
        match self.stmt(id) {
            Stmt::Bad { to, .. } => *to,
            Stmt::Decl(d) => self.decl_end(interner, *d),
            Stmt::Empty { semicolon, implicit } => {
                if *implicit {
                    *semicolon
                } else {
                    Pos(semicolon.0 + 1)
                }
            }
            Stmt::Labeled { stmt, .. } => self.stmt_end(interner, *stmt),
            Stmt::Expr(x) => self.expr_end(interner, *x),
            Stmt::Send { value, .. } => self.expr_end(interner, *value),
            Stmt::IncDec { tok_pos, .. } => Pos(tok_pos.0 + 2),
            Stmt::Assign { rhs, .. } => rhs
                .last()
                .map_or(Pos::NONE, |&x| self.expr_end(interner, x)),
            Stmt::Go { call, .. } | Stmt::Defer { call, .. } => self.expr_end(interner, *call),
            Stmt::Return {
                return_pos,
                results,
            } => results.last().map_or(Pos(return_pos.0 + 6), |&x| {
                self.expr_end(interner, x)
            }),
            Stmt::Branch { pos, op, label } => label.map_or_else(
                || Pos(pos.0 + op.text().len() as u32),
                |l| self.expr_end(interner, l),
            ),
            Stmt::Block { rbrace, .. } => Pos(rbrace.0 + 1),
            Stmt::If {
                body, else_branch, ..
            } => else_branch.map_or_else(
                || self.stmt_end(interner, *body),
                |e| self.stmt_end(interner, e),
            ),
            Stmt::CaseClause { colon, body, .. } | Stmt::CommClause { colon, body, .. } => body
                .last()
                .map_or(Pos(colon.0 + 1), |&s| self.stmt_end(interner, s)),
            Stmt::Switch { body, .. }
            | Stmt::TypeSwitch { body, .. }
            | Stmt::Select { body, .. }
            | Stmt::For { body, .. }
            | Stmt::Range { body, .. } => self.stmt_end(interner, *body),
        }
    }

    pub fn decl_pos(&self, id: DeclId) -> Pos {
        match self.decl(id) {
            Decl::Bad { from, .. } => *from,
            Decl::Gen { tok_pos, .. } => *tok_pos,
            Decl::Func { typ, .. } => self.expr_pos(*typ),
        }
    }

    pub fn decl_end(&self, interner: &StringInterner, id: DeclId) -> Pos {
        match self.decl(id) {
            Decl::Bad { to, .. } => *to,
            Decl::Gen { rparen, specs, .. } => {
                if rparen.is_valid() {
                    Pos(rparen.0 + 1)
                } else {
                    specs
                        .first()
                        .map_or(Pos::NONE, |&s| self.spec_end(interner, s))
                }
            }
            Decl::Func { typ, body, .. } => body.map_or_else(
                || self.expr_end(interner, *typ),
                |b| self.stmt_end(interner, b),
            ),
        }
    }

    pub fn spec_pos(&self, id: SpecId) -> Pos {
        match self.spec(id) {
            Spec::Import { name, path, .. } => {
                name.map_or_else(|| self.expr_pos(*path), |n| self.expr_pos(n))
            }
            Spec::Value { names, .. } => {
                names.first().map_or(Pos::NONE, |&n| self.expr_pos(n))
            }
            Spec::Type { name, .. } => self.expr_pos(*name),
        }
    }

    pub fn spec_end(&self, interner: &StringInterner, id: SpecId) -> Pos {
        match self.spec(id) {
            Spec::Import { path, end_pos, .. } => {
                if end_pos.is_valid() {
                    *end_pos
                } else {
                    self.expr_end(interner, *path)
                }
            }
            Spec::Value {
                names,
                typ,
                values,
                ..
            } => {
                if let Some(&last) = values.last() {
                    self.expr_end(interner, last)
                } else if let Some(t) = typ {
                    self.expr_end(interner, *t)
                } else {
                    names
                        .last()
                        .map_or(Pos::NONE, |&n| self.expr_end(interner, n))
                }
            }
            Spec::Type { typ, .. } => self.expr_end(interner, *typ),
        }
    }

    pub fn field_pos(&self, id: FieldId) -> Pos {
        let field = self.field(id);
        field
            .names
            .first()
            .map_or_else(|| self.expr_pos(field.typ), |&n| self.expr_pos(n))
    }

    pub fn field_end(&self, interner: &StringInterner, id: FieldId) -> Pos {
        let field = self.field(id);
        field.tag.map_or_else(
            || self.expr_end(interner, field.typ),
            |t| self.expr_end(interner, t),
        )
    }

    pub fn field_list_pos(&self, list: &FieldList) -> Pos {
        if list.opening.is_valid() {
            list.opening
        } else {
            list.list.first().map_or(Pos::NONE, |&f| self.field_pos(f))
        }
    }

    pub fn field_list_end(&self, interner: &StringInterner, list: &FieldList) -> Pos {
        if list.closing.is_valid() {
            Pos(list.closing.0 + 1)
        } else {
            list.list
                .last()
                .map_or(Pos::NONE, |&f| self.field_end(interner, f))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::EntityKind;

    fn ident(arena: &mut Arena, interner: &StringInterner, pos: u32, text: &str) -> ExprId {
        arena.alloc_expr(Expr::Ident {
            pos: Pos(pos),
            name: interner.intern(text),
            entity: None,
        })
    }

    #[test]
    fn ident_extent_uses_interned_length() {
        let interner = StringInterner::new();
        let mut arena = Arena::new();
        let x = ident(&mut arena, &interner, 10, "offset");

        assert_eq!(arena.expr_pos(x), Pos(10));
        assert_eq!(arena.expr_end(&interner, x), Pos(16));
    }

    #[test]
    fn binary_extent_spans_operands() {
        let interner = StringInterner::new();
        let mut arena = Arena::new();
        // a + bb
        let a = ident(&mut arena, &interner, 1, "a");
        let b = ident(&mut arena, &interner, 5, "bb");
        let sum = arena.alloc_expr(Expr::Binary {
            x: a,
            op_pos: Pos(3),
            op: Token::Add,
            y: b,
        });

        assert_eq!(arena.expr_pos(sum), Pos(1));
        assert_eq!(arena.expr_end(&interner, sum), Pos(7));
    }

    #[test]
    fn call_extent_ends_after_rparen() {
        let interner = StringInterner::new();
        let mut arena = Arena::new();
        let f = ident(&mut arena, &interner, 1, "f");
        let call = arena.alloc_expr(Expr::Call {
            fun: f,
            lparen: Pos(2),
            args: Vec::new(),
            ellipsis: Pos::NONE,
            rparen: Pos(3),
        });

        assert_eq!(arena.expr_pos(call), Pos(1));
        assert_eq!(arena.expr_end(&interner, call), Pos(4));
    }

    #[test]
    fn empty_stmt_extent_depends_on_implicitness() {
        let interner = StringInterner::new();
        let mut arena = Arena::new();
        let explicit = arena.alloc_stmt(Stmt::Empty {
            semicolon: Pos(5),
            implicit: false,
        });
        let implicit = arena.alloc_stmt(Stmt::Empty {
            semicolon: Pos(5),
            implicit: true,
        });

        assert_eq!(arena.stmt_end(&interner, explicit), Pos(6));
        assert_eq!(arena.stmt_end(&interner, implicit), Pos(5));
    }

    #[test]
    fn gen_decl_extent_without_parens() {
        let interner = StringInterner::new();
        let mut arena = Arena::new();
        // var x int
        let x = ident(&mut arena, &interner, 5, "x");
        let int = ident(&mut arena, &interner, 7, "int");
        let spec = arena.alloc_spec(Spec::Value {
            doc: None,
            names: vec![x],
            typ: Some(int),
            values: Vec::new(),
            comment: None,
        });
        let decl = arena.alloc_decl(Decl::Gen {
            doc: None,
            tok_pos: Pos(1),
            tok: Token::Var,
            lparen: Pos::NONE,
            specs: vec![spec],
            rparen: Pos::NONE,
        });

        assert_eq!(arena.decl_pos(decl), Pos(1));
        assert_eq!(arena.decl_end(&interner, decl), Pos(10));
    }

    #[test]
    fn scope_chain_resolution() {
        let interner = StringInterner::new();
        let mut arena = Arena::new();
        let name = interner.intern("x");
        let entity = arena.alloc_entity(Entity::new(EntityKind::Var, name));

        let outer = arena.alloc_scope(ScopeData::new(None));
        let inner = arena.alloc_scope(ScopeData::new(Some(outer)));
        arena.scope_mut(outer).insert(name, entity);

        assert_eq!(arena.resolve_in_chain(Some(inner), name), Some(entity));
        assert_eq!(
            arena.resolve_in_chain(Some(inner), interner.intern("y")),
            None
        );
    }

    #[test]
    fn field_list_num_fields_counts_names() {
        let interner = StringInterner::new();
        let mut arena = Arena::new();
        let a = ident(&mut arena, &interner, 1, "a");
        let b = ident(&mut arena, &interner, 4, "b");
        let int = ident(&mut arena, &interner, 7, "int");
        let named = arena.alloc_field(Field {
            doc: None,
            names: vec![a, b],
            typ: int,
            tag: None,
            comment: None,
        });
        let embedded_typ = ident(&mut arena, &interner, 12, "io");
        let embedded = arena.alloc_field(Field {
            doc: None,
            names: Vec::new(),
            typ: embedded_typ,
            tag: None,
            comment: None,
        });
        let list = FieldList {
            opening: Pos(0),
            list: vec![named, embedded],
            closing: Pos(15),
        };

        assert_eq!(list.num_fields(&arena), 3);
        assert_eq!(arena.field_list_pos(&list), Pos(0));
        assert_eq!(arena.field_list_end(&interner, &list), Pos(16));
    }
}
