//! The pattern (regex-like) sub-grammar.
//!
//! A pattern occupies the declaration side of a statement: an opening
//! delimiter, a unit sequence, and an optional bare closing delimiter that
//! marks the pattern "total". The unit loop stops at the statement joint or
//! at the line terminal; a literal joint or delimiter inside a pattern must
//! be escaped.

use truth_diagnostic::{Fault, FaultCode};
use truth_ir::{
    Boundary, CharSet, Infix, InfixKind, KnownClass, Name, Pattern, PatternUnit, PatternUnitKind,
    Quantifier, SetEntry, Term, TermInterner,
};
use truth_scan::Scanner;

/// The reserved pattern delimiter.
pub(crate) const DELIMITER: char = '/';

#[expect(
    clippy::cast_possible_truncation,
    reason = "statement lines are far shorter than u32::MAX bytes"
)]
fn offset(scanner: &Scanner<'_>) -> u32 {
    scanner.position() as u32
}

/// Parse a pattern starting at the opening delimiter.
///
/// On success returns the pattern and the byte range it occupies (delimiters
/// included, trailing whitespace before the joint included).
pub(crate) fn parse(
    scanner: &mut Scanner<'_>,
    interner: &TermInterner,
) -> Result<(Pattern, Boundary), Fault> {
    let start = offset(scanner);
    if !scanner.read("/") {
        return Err(Fault::at(
            FaultCode::InvalidPatternStart,
            Boundary::new(start, start),
        ));
    }

    // A quantifier or alternation bar with no atom to bind to.
    if let Some(c) = scanner.peek_grapheme() {
        if matches!(c, '*' | '+' | '?' | '|') {
            return Err(Fault::at(
                FaultCode::InvalidPatternStart,
                Boundary::new(start, offset(scanner)),
            ));
        }
    }

    let mut units = Vec::new();
    while !scanner.is_terminal() && !scanner.peek(":") {
        units.push(parse_unit(scanner, interner, true)?);
    }
    let end = offset(scanner);

    // Right-trim: whitespace between the pattern and the joint is layout,
    // not content.
    while units
        .last()
        .is_some_and(|u| u.is_bare_grapheme(' ') || u.is_bare_grapheme('\t'))
    {
        units.pop();
    }

    // A final bare delimiter closes the pattern and marks it total.
    let is_total = units
        .last()
        .is_some_and(|u| u.is_bare_grapheme(DELIMITER));
    if is_total {
        units.pop();
    }

    if units.is_empty() {
        return Err(Fault::at(FaultCode::EmptyPattern, Boundary::new(start, end)));
    }

    Ok((Pattern { units, is_total }, Boundary::new(start, end)))
}

fn parse_unit(
    scanner: &mut Scanner<'_>,
    interner: &TermInterner,
    top_level: bool,
) -> Result<PatternUnit, Fault> {
    let Some(c) = scanner.peek_grapheme() else {
        // Callers check for the terminal before descending here.
        return Err(Fault::of(FaultCode::EmptyPattern));
    };

    let kind = match c {
        '[' => PatternUnitKind::Set(parse_set(scanner)?),
        '(' => PatternUnitKind::Group(parse_group(scanner, interner)?),
        // Infix syntax is only recognized at the top level of a pattern;
        // nested occurrences fall through to literal parsing.
        '<' if top_level => PatternUnitKind::Infix(parse_infix(scanner, interner)?),
        '\\' => parse_escape(scanner),
        '.' => {
            let _ = scanner.read_grapheme();
            PatternUnitKind::Class(KnownClass::Any)
        }
        _ => {
            let _ = scanner.read_grapheme();
            PatternUnitKind::Grapheme(c)
        }
    };

    let quantifier = parse_quantifier(scanner);
    if quantifier.is_some() {
        // The target regex engine cannot express a quantified quantifier.
        let probe_start = offset(scanner);
        let mut probe = *scanner;
        if parse_quantifier(&mut probe).is_some() {
            return Err(Fault::at(
                FaultCode::DuplicateQuantifier,
                Boundary::new(probe_start, offset(&probe)),
            ));
        }
    }

    Ok(PatternUnit { kind, quantifier })
}

/// Escape handling: known class letters become classes, everything else
/// becomes the literal escaped grapheme. A trailing bare escape is itself
/// a literal.
fn parse_escape(scanner: &mut Scanner<'_>) -> PatternUnitKind {
    let _ = scanner.read_grapheme(); // the escape character
    match scanner.peek_grapheme() {
        Some('d') => consume_class(scanner, KnownClass::Digit),
        Some('D') => consume_class(scanner, KnownClass::NonDigit),
        Some('w') => consume_class(scanner, KnownClass::Word),
        Some('W') => consume_class(scanner, KnownClass::NonWord),
        Some('s') => consume_class(scanner, KnownClass::Whitespace),
        Some('S') => consume_class(scanner, KnownClass::NonWhitespace),
        Some(other) => {
            let _ = scanner.read_grapheme();
            PatternUnitKind::Grapheme(other)
        }
        None => PatternUnitKind::Grapheme('\\'),
    }
}

fn consume_class(scanner: &mut Scanner<'_>, class: KnownClass) -> PatternUnitKind {
    let _ = scanner.read_grapheme();
    PatternUnitKind::Class(class)
}

/// Parse `* + ? {m} {m,} {m,n}`, each optionally followed by a restraining
/// `?`. Returns `None` (without advancing) when no quantifier is present;
/// a malformed brace form is left untouched for literal parsing.
fn parse_quantifier(scanner: &mut Scanner<'_>) -> Option<Quantifier> {
    let mut quantifier = match scanner.peek_grapheme()? {
        '*' => {
            let _ = scanner.read_grapheme();
            Quantifier::ZERO_OR_MORE
        }
        '+' => {
            let _ = scanner.read_grapheme();
            Quantifier::ONE_OR_MORE
        }
        '?' => {
            let _ = scanner.read_grapheme();
            Quantifier::ZERO_OR_ONE
        }
        '{' => parse_brace_quantifier(scanner)?,
        _ => return None,
    };

    if scanner.read("?") {
        quantifier = quantifier.restrained();
    }
    Some(quantifier)
}

fn parse_brace_quantifier(scanner: &mut Scanner<'_>) -> Option<Quantifier> {
    let saved = scanner.position();
    let _ = scanner.read_grapheme(); // '{'

    let Some(min) = read_number(scanner) else {
        scanner.set_position(saved);
        return None;
    };

    let max = if scanner.read(",") {
        read_number(scanner) // `{m,}` leaves max unbounded
    } else {
        Some(min) // `{m}`
    };

    if !scanner.read("}") {
        scanner.set_position(saved);
        return None;
    }

    Some(Quantifier {
        min,
        max,
        restrained: false,
    })
}

fn read_number(scanner: &mut Scanner<'_>) -> Option<u32> {
    let mut value: u32 = 0;
    let mut any = false;
    while let Some(c) = scanner.peek_grapheme() {
        let Some(digit) = c.to_digit(10) else { break };
        let _ = scanner.read_grapheme();
        value = value.saturating_mul(10).saturating_add(digit);
        any = true;
    }
    any.then_some(value)
}

/// Parse a character set: `[...]` with optional leading negation.
fn parse_set(scanner: &mut Scanner<'_>) -> Result<CharSet, Fault> {
    let start = offset(scanner);
    let _ = scanner.read_grapheme(); // '['
    let negated = scanner.read("^");
    let mut entries = Vec::new();

    loop {
        if scanner.is_terminal() {
            return Err(Fault::at(
                FaultCode::UnterminatedCharacterSet,
                Boundary::new(start, offset(scanner)),
            ));
        }
        if scanner.read("]") {
            return Ok(CharSet { negated, entries });
        }
        entries.push(parse_set_entry(scanner, start)?);
    }
}

fn parse_set_entry(scanner: &mut Scanner<'_>, set_start: u32) -> Result<SetEntry, Fault> {
    if scanner.peek("\\") {
        let _ = scanner.read_grapheme();
        return match scanner.peek_grapheme() {
            Some('d') => Ok(set_class(scanner, KnownClass::Digit)),
            Some('D') => Ok(set_class(scanner, KnownClass::NonDigit)),
            Some('w') => Ok(set_class(scanner, KnownClass::Word)),
            Some('W') => Ok(set_class(scanner, KnownClass::NonWord)),
            Some('s') => Ok(set_class(scanner, KnownClass::Whitespace)),
            Some('S') => Ok(set_class(scanner, KnownClass::NonWhitespace)),
            Some('p') => parse_unicode_block(scanner, set_start),
            Some(other) => {
                let _ = scanner.read_grapheme();
                Ok(SetEntry::Char(other))
            }
            None => Err(Fault::at(
                FaultCode::UnterminatedCharacterSet,
                Boundary::new(set_start, offset(scanner)),
            )),
        };
    }

    // A plain grapheme, possibly the low end of a range. A `-` directly
    // before `]` is a literal.
    let Some(low) = scanner.read_grapheme() else {
        return Err(Fault::at(
            FaultCode::UnterminatedCharacterSet,
            Boundary::new(set_start, offset(scanner)),
        ));
    };
    if scanner.peek("-") && !scanner.peek("-]") {
        let _ = scanner.read_grapheme();
        if let Some(high) = scanner.read_grapheme() {
            return Ok(SetEntry::Range(low, high));
        }
        return Err(Fault::at(
            FaultCode::UnterminatedCharacterSet,
            Boundary::new(set_start, offset(scanner)),
        ));
    }
    Ok(SetEntry::Char(low))
}

fn set_class(scanner: &mut Scanner<'_>, class: KnownClass) -> SetEntry {
    let _ = scanner.read_grapheme();
    SetEntry::Class(class)
}

/// `\p{Block}` unicode block reference inside a set.
fn parse_unicode_block(scanner: &mut Scanner<'_>, set_start: u32) -> Result<SetEntry, Fault> {
    let _ = scanner.read_grapheme(); // 'p'
    if !scanner.read("{") {
        return Ok(SetEntry::Char('p'));
    }
    let name = scanner.read_until(Some('}'));
    if !scanner.read("}") {
        return Err(Fault::at(
            FaultCode::UnterminatedCharacterSet,
            Boundary::new(set_start, offset(scanner)),
        ));
    }
    Ok(SetEntry::UnicodeBlock(name.to_owned()))
}

/// Parse an alternation group: `(case|case|...)`. Nested groups and sets
/// are permitted; infixes are not recognized inside.
fn parse_group(
    scanner: &mut Scanner<'_>,
    interner: &TermInterner,
) -> Result<Vec<Vec<PatternUnit>>, Fault> {
    let start = offset(scanner);
    let _ = scanner.read_grapheme(); // '('
    let mut cases = Vec::new();
    let mut current = Vec::new();

    loop {
        if scanner.is_terminal() {
            return Err(Fault::at(
                FaultCode::UnterminatedGroup,
                Boundary::new(start, offset(scanner)),
            ));
        }
        if scanner.read(")") {
            cases.push(current);
            return Ok(cases);
        }
        if scanner.read("|") {
            cases.push(std::mem::take(&mut current));
            continue;
        }
        current.push(parse_unit(scanner, interner, false)?);
    }
}

/// Parse an infix: `<terms>`, `<<terms>>` or `</terms/>`, with an optional
/// internal joint separating declaration and annotation terms.
fn parse_infix(scanner: &mut Scanner<'_>, interner: &TermInterner) -> Result<Infix, Fault> {
    let start = offset(scanner);
    let (kind, closer) = if scanner.read("</") {
        (InfixKind::Pattern, "/>")
    } else if scanner.read("<<") {
        (InfixKind::Nominal, ">>")
    } else {
        let _ = scanner.read_grapheme(); // '<'
        (InfixKind::Population, ">")
    };

    let mut lhs: Vec<Term> = Vec::new();
    let mut rhs: Vec<Term> = Vec::new();
    let mut in_rhs = false;
    let mut buf = String::new();

    let mut push_term = |buf: &mut String, into: &mut Vec<Term>| {
        let trimmed = buf.trim();
        if !trimmed.is_empty() {
            let (text, is_list) = match trimmed.strip_suffix("...") {
                Some(stripped) => (stripped, true),
                None => (trimmed, false),
            };
            let name = interner.intern(text);
            into.push(Term { name, is_list });
        }
        buf.clear();
    };

    loop {
        if scanner.is_terminal() {
            return Err(Fault::at(
                FaultCode::UnterminatedInfix,
                Boundary::new(start, offset(scanner)),
            ));
        }
        if scanner.read(closer) {
            push_term(&mut buf, if in_rhs { &mut rhs } else { &mut lhs });
            break;
        }
        if scanner.read(",") {
            push_term(&mut buf, if in_rhs { &mut rhs } else { &mut lhs });
            continue;
        }
        if !in_rhs && scanner.read(":") {
            push_term(&mut buf, &mut lhs);
            in_rhs = true;
            continue;
        }
        if let Some(c) = scanner.read_grapheme() {
            buf.push(c);
        }
    }

    Ok(Infix {
        kind,
        lhs,
        rhs,
        boundary: Boundary::new(start, offset(scanner)),
    })
}

/// Semantic checks run at the statement level after a successful parse.
pub(crate) fn semantic_faults(
    pattern: &Pattern,
    has_annotations: bool,
    boundary: Boundary,
) -> Vec<Fault> {
    let mut faults = Vec::new();

    if !has_annotations {
        faults.push(Fault::at(FaultCode::PatternWithoutAnnotations, boundary));
    }
    if pattern.can_match_empty() {
        faults.push(Fault::at(FaultCode::PatternCanMatchEmpty, boundary));
    }
    if !pattern.is_total && pattern.has_literal(',') {
        faults.push(Fault::at(FaultCode::PartialPatternWithCombinator, boundary));
    }

    let mut population_refs: Vec<Name> = Vec::new();
    let mut portability_refs: Vec<Name> = Vec::new();

    for infix in pattern.infixes() {
        let at = infix.boundary;

        if infix.lhs.iter().chain(&infix.rhs).any(|t| t.is_list) {
            faults.push(Fault::at(FaultCode::InfixHasListTerm, at));
        }
        if infix
            .rhs
            .iter()
            .any(|r| infix.lhs.iter().any(|l| l.name == r.name))
        {
            faults.push(Fault::at(FaultCode::InfixSelfReference, at));
        }
        if has_duplicate_names(&infix.lhs) || has_duplicate_names(&infix.rhs) {
            faults.push(Fault::at(FaultCode::InfixTermRepeated, at));
        }
        if infix.kind == InfixKind::Population && infix.lhs.len() > 1 {
            faults.push(Fault::at(FaultCode::PopulationInfixChaining, at));
        }

        let refs = match infix.kind {
            InfixKind::Population => Some(&mut population_refs),
            InfixKind::Pattern => Some(&mut portability_refs),
            InfixKind::Nominal => None,
        };
        if let Some(refs) = refs {
            for term in &infix.lhs {
                if refs.contains(&term.name) {
                    let code = if infix.kind == InfixKind::Population {
                        FaultCode::DuplicatePopulationReference
                    } else {
                        FaultCode::DuplicatePortabilityReference
                    };
                    faults.push(Fault::at(code, at));
                } else {
                    refs.push(term.name);
                }
            }
        }
    }

    faults
}

fn has_duplicate_names(terms: &[Term]) -> bool {
    terms
        .iter()
        .enumerate()
        .any(|(i, t)| terms[..i].iter().any(|prev| prev.name == t.name))
}
