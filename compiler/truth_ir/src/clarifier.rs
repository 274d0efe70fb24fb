//! Clarifier keys for homograph disambiguation.

use std::hash::Hasher;

use rustc_hash::FxHasher;

use crate::Name;

/// Canonical hash of a statement's annotation terms.
///
/// Two statements annotated with the same set of terms (in any order, with
/// duplicates collapsed) produce the same key, so a declaration's phrase
/// identity survives annotation reordering. The empty annotation set maps
/// to [`ClarifierKey::NONE`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ClarifierKey(u64);

impl ClarifierKey {
    /// Key of the empty annotation set.
    pub const NONE: ClarifierKey = ClarifierKey(0);

    /// Compute the key for a set of annotation terms.
    pub fn of(terms: &[Name]) -> Self {
        if terms.is_empty() {
            return Self::NONE;
        }
        let mut sorted: Vec<Name> = terms.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut hasher = FxHasher::default();
        for name in sorted {
            hasher.write_u32(name.index());
        }
        let hash = hasher.finish();
        // Reserve 0 for the empty set.
        ClarifierKey(if hash == 0 { 1 } else { hash })
    }

    /// True for the empty annotation set.
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Debug for ClarifierKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ClarifierKey({:#x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TermInterner;

    #[test]
    fn order_insensitive() {
        let interner = TermInterner::new();
        let a = interner.intern("a");
        let b = interner.intern("b");
        assert_eq!(ClarifierKey::of(&[a, b]), ClarifierKey::of(&[b, a]));
    }

    #[test]
    fn duplicates_collapse() {
        let interner = TermInterner::new();
        let a = interner.intern("a");
        assert_eq!(ClarifierKey::of(&[a, a]), ClarifierKey::of(&[a]));
    }

    #[test]
    fn empty_is_none() {
        assert_eq!(ClarifierKey::of(&[]), ClarifierKey::NONE);
        assert!(ClarifierKey::of(&[]).is_none());
    }

    #[test]
    fn distinct_sets_distinct_keys() {
        let interner = TermInterner::new();
        let a = interner.intern("a");
        let b = interner.intern("b");
        assert_ne!(ClarifierKey::of(&[a]), ClarifierKey::of(&[b]));
        assert_ne!(ClarifierKey::of(&[a]), ClarifierKey::NONE);
    }
}
