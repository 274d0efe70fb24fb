//! Pattern declarations: the regex-like sub-language AST.
//!
//! Only the shape lives here. Parsing is in `truth_parse`; matching against
//! candidate strings belongs to the external fact resolver.

use crate::{Boundary, Term};

/// Repetition applied to one pattern unit.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Quantifier {
    pub min: u32,
    /// `None` means unbounded.
    pub max: Option<u32>,
    /// Non-greedy (`?` suffix on the quantifier).
    pub restrained: bool,
}

impl Quantifier {
    /// `*`
    pub const ZERO_OR_MORE: Quantifier = Quantifier {
        min: 0,
        max: None,
        restrained: false,
    };

    /// `+`
    pub const ONE_OR_MORE: Quantifier = Quantifier {
        min: 1,
        max: None,
        restrained: false,
    };

    /// `?`
    pub const ZERO_OR_ONE: Quantifier = Quantifier {
        min: 0,
        max: Some(1),
        restrained: false,
    };

    /// Mark this quantifier restrained (non-greedy).
    #[must_use]
    pub const fn restrained(mut self) -> Self {
        self.restrained = true;
        self
    }

    /// True when the quantifier permits zero occurrences.
    #[inline]
    pub const fn allows_zero(self) -> bool {
        self.min == 0
    }
}

/// Known character classes, the `\d`-style escapes plus the any-grapheme dot.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum KnownClass {
    /// `.`
    Any,
    /// `\d`
    Digit,
    /// `\D`
    NonDigit,
    /// `\w`
    Word,
    /// `\W`
    NonWord,
    /// `\s`
    Whitespace,
    /// `\S`
    NonWhitespace,
}

/// One entry inside a character set.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum SetEntry {
    /// A single grapheme.
    Char(char),
    /// An explicit range, e.g. `a-z`.
    Range(char, char),
    /// A nested known class, e.g. `[\d-]`.
    Class(KnownClass),
    /// A unicode block reference, e.g. `\p{Greek}`.
    UnicodeBlock(String),
}

/// A character set: `[...]`, optionally negated.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct CharSet {
    pub negated: bool,
    pub entries: Vec<SetEntry>,
}

/// Kind of embedded sub-declaration inside a pattern.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum InfixKind {
    /// `<...>` — matches values of the population of the named type.
    Population,
    /// `<<...>>` — binds the matched region as a nominal sub-type.
    Nominal,
    /// `</.../>` — delegates to the named type's own pattern.
    Pattern,
}

/// An embedded sub-declaration: declaration terms, optionally annotated
/// after an internal joint.
#[derive(Clone, PartialEq, Debug)]
pub struct Infix {
    pub kind: InfixKind,
    /// Declaration terms (left of the internal joint).
    pub lhs: Vec<Term>,
    /// Annotation terms (right of the internal joint).
    pub rhs: Vec<Term>,
    /// Byte range of the whole infix within the statement line.
    pub boundary: Boundary,
}

/// What one pattern unit matches.
#[derive(Clone, PartialEq, Debug)]
pub enum PatternUnitKind {
    /// A literal grapheme.
    Grapheme(char),
    /// A known character class.
    Class(KnownClass),
    /// A character set.
    Set(CharSet),
    /// An alternation group; each case is a unit sequence.
    Group(Vec<Vec<PatternUnit>>),
    /// A top-level infix.
    Infix(Infix),
}

/// One unit of a pattern: an atom plus its optional quantifier.
#[derive(Clone, PartialEq, Debug)]
pub struct PatternUnit {
    pub kind: PatternUnitKind,
    pub quantifier: Option<Quantifier>,
}

impl PatternUnit {
    /// A bare (un-quantified) unit.
    pub fn bare(kind: PatternUnitKind) -> Self {
        PatternUnit {
            kind,
            quantifier: None,
        }
    }

    /// True when this unit can match zero graphemes.
    pub fn can_match_empty(&self) -> bool {
        if self.quantifier.is_some_and(Quantifier::allows_zero) {
            return true;
        }
        match &self.kind {
            PatternUnitKind::Group(cases) => cases
                .iter()
                .any(|case| case.iter().all(PatternUnit::can_match_empty)),
            _ => false,
        }
    }

    /// True when the unit is exactly an un-quantified literal grapheme `c`.
    pub fn is_bare_grapheme(&self, c: char) -> bool {
        self.quantifier.is_none() && matches!(self.kind, PatternUnitKind::Grapheme(g) if g == c)
    }
}

/// A fully parsed pattern declaration.
#[derive(Clone, PartialEq, Debug)]
pub struct Pattern {
    pub units: Vec<PatternUnit>,
    /// Total patterns must match an entire candidate string.
    pub is_total: bool,
}

impl Pattern {
    /// True when the compiled form would accept the empty string.
    pub fn can_match_empty(&self) -> bool {
        self.units.iter().all(PatternUnit::can_match_empty)
    }

    /// True when any top-level literal unit is the given grapheme.
    pub fn has_literal(&self, c: char) -> bool {
        self.units
            .iter()
            .any(|u| matches!(u.kind, PatternUnitKind::Grapheme(g) if g == c))
    }

    /// All top-level infixes, in source order.
    pub fn infixes(&self) -> impl Iterator<Item = &Infix> {
        self.units.iter().filter_map(|u| match &u.kind {
            PatternUnitKind::Infix(infix) => Some(infix),
            _ => None,
        })
    }
}
