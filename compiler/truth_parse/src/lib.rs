//! Statement parsing for the Truth compiler.
//!
//! The crate turns one line of source text into a [`Statement`]: typed
//! declaration and annotation [`Span`]s, a joint offset, statement flags,
//! and a frozen fault list. Pattern declarations are parsed by a nested
//! sub-grammar with character sets, groups, quantifiers and infixes.
//!
//! Parsing never fails and never panics: structurally broken lines come
//! back as cruft statements carrying their fault, so one bad line never
//! aborts a document load.

mod parser;
mod pattern;
mod statement;

pub use parser::parse_statement;
pub use statement::{Span, SpanList, Statement};
