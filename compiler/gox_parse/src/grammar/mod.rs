//! The grammar productions, split by syntactic category.
//!
//! Each submodule extends [`Parser`](crate::parser::Parser) with one
//! layer of the grammar. Productions return `PResult`; the only `Err`
//! is the error-cap bail-out, which unwinds to the entry points in the
//! crate root.

mod decl;
mod expr;
mod stmt;
mod ty;
