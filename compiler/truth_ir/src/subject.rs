//! Span subjects: what a declaration or annotation boundary refers to.

use std::fmt;

use crate::{KnownUri, Name, Pattern};

/// An identifier term, possibly marked as a list type.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Term {
    pub name: Name,
    /// True when the term carries the trailing list operator (`...`).
    pub is_list: bool,
}

impl Term {
    /// A plain (non-list) term.
    #[inline]
    pub const fn new(name: Name) -> Self {
        Term {
            name,
            is_list: false,
        }
    }

    /// A list-marked term.
    #[inline]
    pub const fn list(name: Name) -> Self {
        Term {
            name,
            is_list: true,
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_list {
            write!(f, "Term({:?}...)", self.name)
        } else {
            write!(f, "Term({:?})", self.name)
        }
    }
}

/// The subject of one span.
#[derive(Clone, PartialEq, Debug)]
pub enum Subject {
    /// An identifier term.
    Term(Term),
    /// A parsed pattern declaration.
    Pattern(Box<Pattern>),
    /// A URI declaration.
    Uri(KnownUri),
    /// The anonymous type synthesized for a bare joint.
    Anonymous,
}

impl Subject {
    /// The term name, when the subject is a term.
    #[inline]
    pub fn term_name(&self) -> Option<Name> {
        match self {
            Subject::Term(term) => Some(term.name),
            _ => None,
        }
    }

    /// True for the anonymous/void sentinel.
    #[inline]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Subject::Anonymous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TermInterner;

    #[test]
    fn term_name_extraction() {
        let interner = TermInterner::new();
        let name = interner.intern("fact");
        assert_eq!(Subject::Term(Term::new(name)).term_name(), Some(name));
        assert_eq!(Subject::Anonymous.term_name(), None);
    }
}
