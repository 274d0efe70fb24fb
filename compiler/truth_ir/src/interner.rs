//! Interner for term names.
//!
//! Provides O(1) interning and lookup. The compiler itself runs on one
//! logical thread, but the interner keeps an `RwLock` so external tooling
//! (formatters, language servers) can share it.

// Arc is needed so a Program and external tooling can share one interner.
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Interned term name.
///
/// Equality and hashing are O(1) index comparisons. A `Name` is only
/// meaningful together with the [`TermInterner`] that produced it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Name(u32);

impl Name {
    /// The empty term, pre-interned at index 0.
    pub const EMPTY: Name = Name(0);

    /// Raw index into the interner's storage.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

/// Error when interning a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternError {
    /// Interner exceeded capacity (over 4 billion terms).
    Overflow { count: usize },
}

impl fmt::Display for InternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InternError::Overflow { count } => {
                write!(
                    f,
                    "term interner exceeded capacity: {count} terms, max is {}",
                    u32::MAX
                )
            }
        }
    }
}

impl std::error::Error for InternError {}

struct InternStore {
    /// Map from term content to index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for term contents.
    strings: Vec<&'static str>,
}

impl InternStore {
    fn with_empty() -> Self {
        let empty: &'static str = "";
        let mut map = FxHashMap::default();
        map.insert(empty, 0);
        InternStore {
            map,
            strings: vec![empty],
        }
    }
}

/// Interner mapping term text to compact [`Name`] handles.
#[derive(Clone)]
pub struct TermInterner {
    store: Arc<RwLock<InternStore>>,
}

impl TermInterner {
    /// Create a new interner with the empty term pre-interned.
    pub fn new() -> Self {
        TermInterner {
            store: Arc::new(RwLock::new(InternStore::with_empty())),
        }
    }

    /// Try to intern a string, returning its [`Name`] or an error on overflow.
    pub fn try_intern(&self, s: &str) -> Result<Name, InternError> {
        // Fast path: already interned.
        {
            let store = self.store.read();
            if let Some(&idx) = store.map.get(s) {
                return Ok(Name(idx));
            }
        }

        let mut store = self.store.write();
        // Re-check under the write lock: another caller may have raced us.
        if let Some(&idx) = store.map.get(s) {
            return Ok(Name(idx));
        }

        let count = store.strings.len();
        let idx = u32::try_from(count).map_err(|_| InternError::Overflow { count })?;

        // Leak the string so the map key and storage can both borrow it for
        // the life of the process. Interners are created once per Program.
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        store.map.insert(leaked, idx);
        store.strings.push(leaked);
        Ok(Name(idx))
    }

    /// Intern a string.
    ///
    /// # Panics
    ///
    /// Panics on interner overflow (more than `u32::MAX` distinct terms).
    #[expect(clippy::unwrap_used, reason = "overflow requires 4 billion distinct terms")]
    pub fn intern(&self, s: &str) -> Name {
        self.try_intern(s).unwrap()
    }

    /// Look up the text of an interned name.
    ///
    /// Returns the empty string for a name from a different interner that
    /// happens to be out of range.
    pub fn resolve(&self, name: Name) -> &'static str {
        let store = self.store.read();
        store
            .strings
            .get(name.0 as usize)
            .copied()
            .unwrap_or_default()
    }

    /// Number of interned terms, including the pre-interned empty term.
    pub fn len(&self) -> usize {
        self.store.read().strings.len()
    }

    /// Check whether only the empty term is interned.
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }
}

impl Default for TermInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TermInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TermInterner")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_dedup() {
        let interner = TermInterner::new();
        let a = interner.intern("mammal");
        let b = interner.intern("mammal");
        let c = interner.intern("reptile");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn resolve_round_trip() {
        let interner = TermInterner::new();
        let name = interner.intern("animal");
        assert_eq!(interner.resolve(name), "animal");
    }

    #[test]
    fn empty_pre_interned() {
        let interner = TermInterner::new();
        assert_eq!(interner.intern(""), Name::EMPTY);
        assert_eq!(interner.resolve(Name::EMPTY), "");
        assert!(interner.is_empty());
    }

    #[test]
    fn shared_clone_sees_interned() {
        let interner = TermInterner::new();
        let shared = interner.clone();
        let a = interner.intern("shared");
        assert_eq!(shared.intern("shared"), a);
    }
}
