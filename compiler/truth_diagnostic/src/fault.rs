//! Fault records and codes.

use std::fmt;

use truth_ir::Boundary;

/// Severity of a fault.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    /// The construct is invalid and excluded from graph construction.
    Error,
    /// The construct is suspect but still participates.
    Advisory,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Advisory => write!(f, "advisory"),
        }
    }
}

/// Fault codes for all compiler diagnostics.
///
/// Numeric format: T### where the first digit indicates the phase:
/// - T1xx: statement-level parse faults
/// - T2xx: pattern faults (syntactic, then semantic)
/// - T3xx: reference faults
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FaultCode {
    // Statement faults (T1xx)
    /// Line begins with the combinator.
    StatementBeginsWithComma,
    /// Line begins with the list operator.
    StatementBeginsWithEllipsis,
    /// Line begins with an escaped space or tab.
    StatementBeginsWithEscapedSpace,
    /// Line consists of nothing but the escape character.
    StatementContainsOnlyEscapeCharacter,
    /// Tabs and spaces mixed within one statement's leading whitespace.
    MixedIndent,
    /// The same term declared more than once on one line.
    DuplicateDeclaration,

    // Pattern syntax faults (T2xx)
    /// Pattern body parsed to zero units.
    EmptyPattern,
    /// Pattern body begins with a reserved sequence.
    InvalidPatternStart,
    /// `[` without a matching `]`.
    UnterminatedCharacterSet,
    /// `(` without a matching `)`.
    UnterminatedGroup,
    /// Infix opener without its closer.
    UnterminatedInfix,
    /// Two consecutive quantifiers on one atom.
    DuplicateQuantifier,

    // Pattern semantic faults (T25x)
    /// Pattern declared with no annotations to match against.
    PatternWithoutAnnotations,
    /// Pattern's compiled form can match the empty string.
    PatternCanMatchEmpty,
    /// Partial pattern contains a literal combinator.
    PartialPatternWithCombinator,
    /// Infix declares a list-marked term.
    InfixHasListTerm,
    /// Infix annotation re-declares one of its own declaration terms.
    InfixSelfReference,
    /// A term repeated within one infix.
    InfixTermRepeated,
    /// Population infix declares more than one term.
    PopulationInfixChaining,
    /// Two population infixes reference the same term.
    DuplicatePopulationReference,
    /// Two portability (pattern) infixes reference the same term.
    DuplicatePortabilityReference,

    // Reference faults (T3xx)
    /// Two statements reference the same document.
    DuplicateReference,
    /// Insecure document referenced from a secure one.
    InsecureReference,
    /// Referenced document could not be loaded.
    UnresolvedReference,
}

impl FaultCode {
    /// Every code, in numeric order.
    pub const ALL: &'static [FaultCode] = &[
        FaultCode::StatementBeginsWithComma,
        FaultCode::StatementBeginsWithEllipsis,
        FaultCode::StatementBeginsWithEscapedSpace,
        FaultCode::StatementContainsOnlyEscapeCharacter,
        FaultCode::MixedIndent,
        FaultCode::DuplicateDeclaration,
        FaultCode::EmptyPattern,
        FaultCode::InvalidPatternStart,
        FaultCode::UnterminatedCharacterSet,
        FaultCode::UnterminatedGroup,
        FaultCode::UnterminatedInfix,
        FaultCode::DuplicateQuantifier,
        FaultCode::PatternWithoutAnnotations,
        FaultCode::PatternCanMatchEmpty,
        FaultCode::PartialPatternWithCombinator,
        FaultCode::InfixHasListTerm,
        FaultCode::InfixSelfReference,
        FaultCode::InfixTermRepeated,
        FaultCode::PopulationInfixChaining,
        FaultCode::DuplicatePopulationReference,
        FaultCode::DuplicatePortabilityReference,
        FaultCode::DuplicateReference,
        FaultCode::InsecureReference,
        FaultCode::UnresolvedReference,
    ];

    /// Look a code up from its `T###` display form.
    pub fn parse(text: &str) -> Option<FaultCode> {
        let digits = text.strip_prefix('T').unwrap_or(text);
        let number: u16 = digits.parse().ok()?;
        FaultCode::ALL.iter().copied().find(|c| c.code() == number)
    }

    /// Numeric code for searchability.
    pub const fn code(self) -> u16 {
        match self {
            FaultCode::StatementBeginsWithComma => 101,
            FaultCode::StatementBeginsWithEllipsis => 102,
            FaultCode::StatementBeginsWithEscapedSpace => 103,
            FaultCode::StatementContainsOnlyEscapeCharacter => 104,
            FaultCode::MixedIndent => 105,
            FaultCode::DuplicateDeclaration => 106,

            FaultCode::EmptyPattern => 201,
            FaultCode::InvalidPatternStart => 202,
            FaultCode::UnterminatedCharacterSet => 203,
            FaultCode::UnterminatedGroup => 204,
            FaultCode::UnterminatedInfix => 205,
            FaultCode::DuplicateQuantifier => 206,

            FaultCode::PatternWithoutAnnotations => 251,
            FaultCode::PatternCanMatchEmpty => 252,
            FaultCode::PartialPatternWithCombinator => 253,
            FaultCode::InfixHasListTerm => 254,
            FaultCode::InfixSelfReference => 255,
            FaultCode::InfixTermRepeated => 256,
            FaultCode::PopulationInfixChaining => 257,
            FaultCode::DuplicatePopulationReference => 258,
            FaultCode::DuplicatePortabilityReference => 259,

            FaultCode::DuplicateReference => 301,
            FaultCode::InsecureReference => 302,
            FaultCode::UnresolvedReference => 303,
        }
    }

    /// Default severity for this code.
    pub const fn severity(self) -> Severity {
        match self {
            FaultCode::MixedIndent
            | FaultCode::DuplicateDeclaration
            | FaultCode::DuplicateReference
            | FaultCode::InsecureReference => Severity::Advisory,
            _ => Severity::Error,
        }
    }

    /// Human-readable description of the fault.
    pub const fn description(self) -> &'static str {
        match self {
            FaultCode::StatementBeginsWithComma => "statement begins with a comma",
            FaultCode::StatementBeginsWithEllipsis => "statement begins with the list operator",
            FaultCode::StatementBeginsWithEscapedSpace => {
                "statement begins with an escaped space or tab"
            }
            FaultCode::StatementContainsOnlyEscapeCharacter => {
                "statement contains only the escape character"
            }
            FaultCode::MixedIndent => "tabs and spaces mixed in leading whitespace",
            FaultCode::DuplicateDeclaration => "term declared more than once on this line",
            FaultCode::EmptyPattern => "pattern has no content",
            FaultCode::InvalidPatternStart => "pattern begins with a reserved sequence",
            FaultCode::UnterminatedCharacterSet => "unterminated character set",
            FaultCode::UnterminatedGroup => "unterminated alternation group",
            FaultCode::UnterminatedInfix => "unterminated infix",
            FaultCode::DuplicateQuantifier => "duplicate quantifier on one atom",
            FaultCode::PatternWithoutAnnotations => "pattern declared without annotations",
            FaultCode::PatternCanMatchEmpty => "pattern can match the empty string",
            FaultCode::PartialPatternWithCombinator => {
                "partial pattern contains a literal comma"
            }
            FaultCode::InfixHasListTerm => "infix declares a list term",
            FaultCode::InfixSelfReference => "infix re-declares one of its own terms",
            FaultCode::InfixTermRepeated => "term repeated within one infix",
            FaultCode::PopulationInfixChaining => {
                "population infix declares more than one term"
            }
            FaultCode::DuplicatePopulationReference => {
                "multiple population infixes reference the same term"
            }
            FaultCode::DuplicatePortabilityReference => {
                "multiple pattern infixes reference the same term"
            }
            FaultCode::DuplicateReference => "document referenced more than once",
            FaultCode::InsecureReference => {
                "insecure document referenced from a secure document"
            }
            FaultCode::UnresolvedReference => "referenced document could not be loaded",
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{:03}", self.code())
    }
}

/// A fault attached to a location within one statement.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "faults should be recorded, not silently dropped"]
pub struct Fault {
    pub code: FaultCode,
    /// Byte range within the statement's line, when one is known.
    pub boundary: Option<Boundary>,
}

impl Fault {
    /// Fault covering the whole statement.
    pub const fn of(code: FaultCode) -> Self {
        Fault {
            code,
            boundary: None,
        }
    }

    /// Fault pinned to a byte range within the line.
    pub const fn at(code: FaultCode, boundary: Boundary) -> Self {
        Fault {
            code,
            boundary: Some(boundary),
        }
    }

    /// Severity, delegated to the code.
    pub const fn severity(&self) -> Severity {
        self.code.severity()
    }
}

/// A fault located at a document line, ready for reporting.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct LocatedFault {
    /// 1-based line number.
    pub line: u32,
    pub fault: Fault,
}

impl fmt::Display for LocatedFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] line {}: {}",
            self.fault.severity(),
            self.fault.code,
            self.line,
            self.fault.code.description()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn code_formatting() {
        assert_eq!(FaultCode::EmptyPattern.to_string(), "T201");
        assert_eq!(FaultCode::StatementBeginsWithComma.to_string(), "T101");
    }

    #[test]
    fn parse_round_trips_all_codes() {
        for &code in FaultCode::ALL {
            assert_eq!(FaultCode::parse(&code.to_string()), Some(code));
        }
        assert_eq!(FaultCode::parse("T999"), None);
        assert_eq!(FaultCode::parse("bogus"), None);
    }

    #[test]
    fn severity_mapping() {
        assert_eq!(FaultCode::EmptyPattern.severity(), Severity::Error);
        assert_eq!(FaultCode::MixedIndent.severity(), Severity::Advisory);
        assert_eq!(FaultCode::InsecureReference.severity(), Severity::Advisory);
    }

    #[test]
    fn located_display() {
        let located = LocatedFault {
            line: 3,
            fault: Fault::of(FaultCode::EmptyPattern),
        };
        assert_eq!(
            located.to_string(),
            "error[T201] line 3: pattern has no content"
        );
    }
}
