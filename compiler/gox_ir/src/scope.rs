//! Lexical scopes and the entities declared in them.
//!
//! Scopes and entities live in the syntax [`Arena`](crate::Arena) and are
//! addressed by typed ids, so a scope's parent link and an identifier's
//! binding are plain indices rather than shared ownership.

use crate::ast::{DeclId, FieldId, SpecId, StmtId};
use crate::name::Name;
use rustc_hash::FxHashMap;

/// Index of an [`Entity`] in the arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct EntityId(pub u32);

/// Index of a [`ScopeData`] in the arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ScopeId(pub u32);

impl EntityId {
    /// Marker carried by identifiers the parser saw but could not
    /// resolve within the file (candidates for package-level or
    /// cross-file resolution).
    pub const UNRESOLVED: EntityId = EntityId(u32::MAX);
}

/// What kind of language object an entity names.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum EntityKind {
    /// Placeholder for erroneous declarations.
    Bad,
    Package,
    Const,
    Type,
    Var,
    Func,
    Label,
}

impl EntityKind {
    pub const fn text(self) -> &'static str {
        match self {
            EntityKind::Bad => "bad",
            EntityKind::Package => "package",
            EntityKind::Const => "const",
            EntityKind::Type => "type",
            EntityKind::Var => "var",
            EntityKind::Func => "func",
            EntityKind::Label => "label",
        }
    }
}

/// Link from an entity back to the syntax that declared it.
#[derive(Copy, Clone, Debug)]
pub enum DeclRef {
    Field(FieldId),
    Spec(SpecId),
    Decl(DeclId),
    Stmt(StmtId),
    Scope(ScopeId),
}

/// A named language object: package, constant, type, variable, function,
/// or label.
#[derive(Clone, Debug)]
pub struct Entity {
    pub kind: EntityKind,
    pub name: Name,
    /// The declaring node, when known.
    pub decl: Option<DeclRef>,
    /// For constants, the iota value of the containing spec.
    pub data: Option<u32>,
}

impl Entity {
    pub fn new(kind: EntityKind, name: Name) -> Self {
        Entity {
            kind,
            name,
            decl: None,
            data: None,
        }
    }
}

/// One lexical scope: a table of declared entities plus a link to the
/// enclosing scope.
#[derive(Clone, Debug)]
pub struct ScopeData {
    pub outer: Option<ScopeId>,
    table: FxHashMap<Name, EntityId>,
}

impl ScopeData {
    pub fn new(outer: Option<ScopeId>) -> Self {
        ScopeData {
            outer,
            table: FxHashMap::default(),
        }
    }

    /// Look up `name` in this scope only; callers walk `outer` themselves.
    pub fn lookup(&self, name: Name) -> Option<EntityId> {
        self.table.get(&name).copied()
    }

    /// Insert an entity under `name`. If the scope already holds an
    /// entity for `name`, the table is left unchanged and the previous
    /// occupant is returned so the caller can report a redeclaration.
    pub fn insert(&mut self, name: Name, entity: EntityId) -> Option<EntityId> {
        match self.table.entry(name) {
            std::collections::hash_map::Entry::Occupied(prev) => Some(*prev.get()),
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(entity);
                None
            }
        }
    }

    /// Declared names, in table order.
    pub fn entities(&self) -> impl Iterator<Item = (Name, EntityId)> + '_ {
        self.table.iter().map(|(&name, &id)| (name, id))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interner::StringInterner;

    #[test]
    fn insert_reports_previous_occupant() {
        let interner = StringInterner::new();
        let x = interner.intern("x");
        let mut scope = ScopeData::new(None);

        assert_eq!(scope.insert(x, EntityId(0)), None);
        assert_eq!(scope.insert(x, EntityId(1)), Some(EntityId(0)));
        // First declaration wins.
        assert_eq!(scope.lookup(x), Some(EntityId(0)));
    }

    #[test]
    fn lookup_is_scope_local() {
        let interner = StringInterner::new();
        let x = interner.intern("x");
        let outer = ScopeData::new(None);
        let mut inner = ScopeData::new(Some(ScopeId(0)));
        inner.insert(x, EntityId(3));

        assert_eq!(inner.lookup(x), Some(EntityId(3)));
        assert_eq!(outer.lookup(x), None);
        assert_eq!(inner.outer, Some(ScopeId(0)));
    }

    #[test]
    fn entity_kind_text() {
        assert_eq!(EntityKind::Func.text(), "func");
        assert_eq!(EntityKind::Label.text(), "label");
    }
}
