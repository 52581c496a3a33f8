//! Interned string handle.

use std::fmt;

/// Handle to a string owned by a [`StringInterner`](crate::StringInterner).
///
/// Comparing two `Name`s from the same interner compares string identity
/// in O(1). The value `0` is always the empty string.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Name(u32);

impl Name {
    /// The pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    #[inline]
    pub(crate) const fn from_index(index: u32) -> Self {
        Name(index)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` for the empty string handle.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

// Size assertion: Name is a bare index.
const _: () = assert!(std::mem::size_of::<Name>() == 4);
