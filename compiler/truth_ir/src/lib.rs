//! Shared data model for the Truth compiler.
//!
//! Leaf types used by every other crate in the workspace: source spans,
//! interned term names, statement flags, clarifier keys, edit descriptions
//! and URI subjects. No parsing or graph logic lives here.

mod clarifier;
mod edit;
mod flags;
mod interner;
mod pattern;
mod span;
mod subject;
mod uri;

pub use clarifier::ClarifierKey;
pub use edit::{LineEdit, RangeEdit};
pub use flags::StatementFlags;
pub use interner::{InternError, Name, TermInterner};
pub use pattern::{
    CharSet, Infix, InfixKind, KnownClass, Pattern, PatternUnit, PatternUnitKind, Quantifier,
    SetEntry,
};
pub use span::Boundary;
pub use subject::{Subject, Term};
pub use uri::{KnownUri, UriProtocol, TRUTH_EXTENSION};

/// Assert the size of a type at compile time.
///
/// Keeps hot types from silently growing.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: () = assert!(std::mem::size_of::<$ty>() == $size);
    };
}
