//! Syntax-level IR for the gox front end.
//!
//! This crate owns everything the scanner and parser agree on:
//!
//! - [`pos`]: dense positions, per-file line tables, and the [`FileSet`]
//!   registry shared by every file of a parse session.
//! - [`token`]: the closed token enumeration with precedence and
//!   range-based category checks.
//! - [`ast`]: arena-allocated syntax nodes addressed by typed ids.
//! - [`scope`]: chained lexical scopes and the entities they declare.
//! - [`visitor`]: a depth-first walker over the arena.
//! - [`interner`]: the per-session string interner behind [`Name`].
//!
//! Downstream passes (semantic analysis, pretty-printing) consume the
//! arena plus the scope tables; nothing here performs type checking.

pub mod ast;
pub mod comment;
pub mod interner;
mod name;
pub mod pos;
pub mod scope;
pub mod token;
pub mod visitor;

pub use ast::{
    Arena, ChanDir, CommentId, Decl, DeclId, Expr, ExprId, Field, FieldId, FieldList, FileNode,
    Spec, SpecId, Stmt, StmtId,
};
pub use comment::{Comment, CommentGroup};
pub use interner::StringInterner;
pub use name::Name;
pub use pos::{File, FileSet, LineInfo, Pos, Position};
pub use scope::{DeclRef, Entity, EntityId, EntityKind, ScopeData, ScopeId};
pub use token::Token;
pub use visitor::{
    inspect, walk_decl, walk_expr, walk_field, walk_file, walk_spec, walk_stmt, Node, Visitor,
};
