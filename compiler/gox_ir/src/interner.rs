//! String interner backing [`Name`] handles.
//!
//! One interner is constructed per parse session and owned by the caller;
//! there is no process-wide instance, so tests and parallel parses stay
//! isolated. Sibling files of one package may share an interner behind a
//! reference, which is why lookups take `&self` and the tables sit behind
//! a `parking_lot::RwLock`.

use crate::name::Name;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

#[derive(Debug)]
struct InternTable {
    /// Map from string content to index in `strings`.
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

/// Thread-safe string interner.
///
/// Interned strings are leaked to obtain `'static` lifetime; an interner
/// is expected to live for the duration of a parse session (or longer).
#[derive(Debug)]
pub struct StringInterner {
    table: RwLock<InternTable>,
}

impl StringInterner {
    /// Create an interner with the empty string, the blank identifier,
    /// and every keyword pre-interned.
    pub fn new() -> Self {
        let mut table = InternTable {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(128),
        };
        table.map.insert("", 0);
        table.strings.push("");

        let interner = StringInterner {
            table: RwLock::new(table),
        };
        for s in PRE_INTERNED {
            interner.intern(s);
        }
        interner
    }

    /// Intern a string, returning its handle.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` distinct strings are interned.
    pub fn intern(&self, s: &str) -> Name {
        // Fast path: already interned.
        {
            let guard = self.table.read();
            if let Some(&index) = guard.map.get(s) {
                return Name::from_index(index);
            }
        }

        let mut guard = self.table.write();
        // Re-check after acquiring the write lock.
        if let Some(&index) = guard.map.get(s) {
            return Name::from_index(index);
        }

        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let index = u32::try_from(guard.strings.len())
            .unwrap_or_else(|_| panic!("interner exceeded {} strings", u32::MAX));
        guard.strings.push(leaked);
        guard.map.insert(leaked, index);
        Name::from_index(index)
    }

    /// Intern an owned string without re-allocating when it is new.
    pub fn intern_owned(&self, s: String) -> Name {
        {
            let guard = self.table.read();
            if let Some(&index) = guard.map.get(s.as_str()) {
                return Name::from_index(index);
            }
        }

        let mut guard = self.table.write();
        if let Some(&index) = guard.map.get(s.as_str()) {
            return Name::from_index(index);
        }

        let leaked: &'static str = Box::leak(s.into_boxed_str());
        let index = u32::try_from(guard.strings.len())
            .unwrap_or_else(|_| panic!("interner exceeded {} strings", u32::MAX));
        guard.strings.push(leaked);
        guard.map.insert(leaked, index);
        Name::from_index(index)
    }

    /// Look up the string for a handle.
    ///
    /// The `'static` return is sound because interned strings are never
    /// deallocated.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.table.read().strings[name.index()]
    }

    /// Number of distinct interned strings.
    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    /// `true` when only the empty string is interned.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Keywords and common spellings interned at construction so keyword
/// recognition and blank-identifier checks never hit the slow path.
const PRE_INTERNED: &[&str] = &[
    "_", "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range", "return",
    "select", "struct", "switch", "type", "var", "init", "main", "true", "false", "iota", "nil",
];
