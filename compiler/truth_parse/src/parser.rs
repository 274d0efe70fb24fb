//! The staged statement parser.
//!
//! One physical line in, one [`Statement`] out. The parser never fails: a
//! line that cannot be parsed structurally produces a cruft statement
//! carrying the fault, and document loading continues past it.

use truth_diagnostic::{Fault, FaultCode};
use truth_ir::{Boundary, KnownUri, StatementFlags, Subject, Term, TermInterner};
use truth_scan::Scanner;

use crate::pattern;
use crate::statement::{Span, SpanList, Statement};

#[expect(
    clippy::cast_possible_truncation,
    reason = "statement lines are far shorter than u32::MAX bytes"
)]
fn offset(scanner: &Scanner<'_>) -> u32 {
    scanner.position() as u32
}

/// Parse one line into a statement.
///
/// `text` is the raw line; a trailing `\n` (and anything after it) is
/// ignored. Term names are interned through `interner`.
pub fn parse_statement(text: &str, interner: &TermInterner) -> Statement {
    Parser {
        scanner: Scanner::new(text),
        text,
        interner,
        declarations: SpanList::new(),
        annotations: SpanList::new(),
        joint: None,
        flags: StatementFlags::empty(),
        faults: Vec::new(),
        uri: None,
        sum: String::new(),
    }
    .run()
}

struct Parser<'a> {
    scanner: Scanner<'a>,
    text: &'a str,
    interner: &'a TermInterner,
    declarations: SpanList,
    annotations: SpanList,
    joint: Option<u32>,
    flags: StatementFlags,
    faults: Vec<Fault>,
    uri: Option<KnownUri>,
    sum: String,
}

impl Parser<'_> {
    fn run(mut self) -> Statement {
        let indent = self.read_indent();

        if self.scanner.is_terminal() {
            self.flags |= StatementFlags::WHITESPACE;
            return self.finish(indent);
        }
        if self.read_comment() {
            self.flags |= StatementFlags::COMMENT;
            return self.finish(indent);
        }
        if self.read_cruft() {
            self.flags |= StatementFlags::CRUFT;
            return self.finish(indent);
        }

        if !self.read_uri() {
            if self.scanner.peek("/") {
                if !self.read_pattern() {
                    self.flags |= StatementFlags::CRUFT;
                    return self.finish(indent);
                }
            } else {
                self.read_terms(true);
            }
        }

        self.read_joint();
        if self.joint.is_some() {
            let rest = self.scanner.remaining();
            let line_end = rest.find('\n').unwrap_or(rest.len());
            self.sum = rest[..line_end].trim().to_owned();
            self.read_terms(false);
        }

        self.post_process();
        self.finish(indent)
    }

    fn finish(self, indent: u32) -> Statement {
        Statement::assemble(
            self.text.to_owned(),
            indent,
            self.declarations,
            self.annotations,
            self.joint,
            self.flags,
            self.faults,
            self.uri,
            self.sum,
        )
    }

    /// Stage 1: leading whitespace. Mixing tabs and spaces is advisory.
    fn read_indent(&mut self) -> u32 {
        let count = self.scanner.read_whitespace();
        let leading = &self.text[..self.scanner.position()];
        if leading.contains(' ') && leading.contains('\t') {
            self.faults.push(Fault::at(
                FaultCode::MixedIndent,
                Boundary::new(0, offset(&self.scanner)),
            ));
        }
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Stage 2: `//` followed by whitespace or end of line.
    fn read_comment(&mut self) -> bool {
        let saved = self.scanner.position();
        if self.scanner.read("//") {
            if self.scanner.is_terminal()
                || matches!(self.scanner.peek_grapheme(), Some(' ' | '\t'))
            {
                return true;
            }
            self.scanner.set_position(saved);
        }
        false
    }

    /// Stage 3: disallowed line starts, checked in a fixed order. Each is
    /// terminal for the statement.
    fn read_cruft(&mut self) -> bool {
        let start = offset(&self.scanner);
        let code = if self.scanner.peek(",") {
            Some(FaultCode::StatementBeginsWithComma)
        } else if self.scanner.peek("...") {
            Some(FaultCode::StatementBeginsWithEllipsis)
        } else if self.scanner.peek("\\ ") || self.scanner.peek("\\\t") {
            Some(FaultCode::StatementBeginsWithEscapedSpace)
        } else if self.scanner.peek_then_terminal("\\") {
            Some(FaultCode::StatementContainsOnlyEscapeCharacter)
        } else {
            None
        };

        if let Some(code) = code {
            self.faults
                .push(Fault::at(code, Boundary::new(start, start + 1)));
            true
        } else {
            false
        }
    }

    /// Stage 4: a URI declaration. Backtracks when the candidate text does
    /// not carry a recognized prefix and the reserved extension.
    fn read_uri(&mut self) -> bool {
        let has_prefix = self.scanner.peek("http://")
            || self.scanner.peek("https://")
            || self.scanner.peek("../")
            || self.scanner.peek("./");
        if !has_prefix {
            return false;
        }

        let saved = self.scanner.position();
        let start = offset(&self.scanner);
        while let Some(c) = self.scanner.peek_grapheme() {
            if c == ' ' || c == '\t' {
                break;
            }
            let _ = self.scanner.read_grapheme();
        }
        let candidate = &self.text[saved..self.scanner.position()];

        let Some(uri) = KnownUri::parse(candidate) else {
            self.scanner.set_position(saved);
            return false;
        };

        let boundary = Boundary::new(start, offset(&self.scanner));
        self.declarations
            .push(Span::new(boundary, Subject::Uri(uri.clone())));
        self.uri = Some(uri);
        self.flags |= StatementFlags::HAS_URI;
        true
    }

    /// Stage 5: a pattern declaration. A pattern fault is terminal.
    fn read_pattern(&mut self) -> bool {
        match pattern::parse(&mut self.scanner, self.interner) {
            Ok((parsed, boundary)) => {
                self.flags |= StatementFlags::HAS_PATTERN;
                self.flags |= if parsed.is_total {
                    StatementFlags::HAS_TOTAL_PATTERN
                } else {
                    StatementFlags::HAS_PARTIAL_PATTERN
                };
                self.declarations
                    .push(Span::new(boundary, Subject::Pattern(Box::new(parsed))));
                true
            }
            Err(fault) => {
                self.faults.push(fault);
                false
            }
        }
    }

    /// Stages 5b/7: comma-separated terms, either side of the joint.
    fn read_terms(&mut self, declaring: bool) {
        loop {
            if self.scanner.is_terminal() {
                break;
            }
            if declaring && self.scanner.peek(":") {
                break;
            }
            self.read_term(declaring);
            if !self.scanner.read(",") {
                break;
            }
        }
    }

    /// Read one term grapheme-by-grapheme, honoring escapes. The boundary
    /// covers the raw consumed text; the interned value is unescaped and
    /// trimmed.
    fn read_term(&mut self, declaring: bool) {
        let start = offset(&self.scanner);
        let mut value = String::new();

        loop {
            if self.scanner.is_terminal() {
                break;
            }
            if self.scanner.peek(",") {
                break;
            }
            if declaring && self.scanner.peek(":") {
                break;
            }
            let Some(c) = self.scanner.read_grapheme() else {
                break;
            };
            if c == '\\' {
                // The escape suppresses the special meaning of the next
                // character; a trailing bare escape is literal.
                match self.scanner.read_grapheme() {
                    Some(escaped) => value.push(escaped),
                    None => value.push('\\'),
                }
            } else {
                value.push(c);
            }
        }

        let boundary = Boundary::new(start, offset(&self.scanner));
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return;
        }

        let (name_text, is_list) = match trimmed.strip_suffix("...") {
            Some(stripped) => (stripped, true),
            None => (trimmed, false),
        };
        let name = self.interner.intern(name_text);
        let span = Span::new(boundary, Subject::Term(Term { name, is_list }));
        if declaring {
            self.declarations.push(span);
        } else {
            self.annotations.push(span);
        }
    }

    /// Stage 6: the joint, with surrounding whitespace tolerated.
    fn read_joint(&mut self) {
        let saved = self.scanner.position();
        let _ = self.scanner.read_whitespace();
        let at = offset(&self.scanner);
        if self.scanner.read(":") {
            self.joint = Some(at);
            let _ = self.scanner.read_whitespace();
        } else {
            self.scanner.set_position(saved);
        }
    }

    /// Stage 8: implicit anonymous declaration, vacuity, semantic pattern
    /// checks, duplicate declarations.
    fn post_process(&mut self) {
        if let Some(at) = self.joint {
            if self.declarations.is_empty() {
                self.declarations
                    .push(Span::new(Boundary::new(at, at), Subject::Anonymous));
                if self.annotations.is_empty() {
                    self.flags |= StatementFlags::VACUOUS;
                }
            }
        }

        let pattern_span = self
            .declarations
            .iter()
            .find_map(|span| match &span.subject {
                Subject::Pattern(p) => Some((p.clone(), span.boundary)),
                _ => None,
            });
        if let Some((parsed, boundary)) = pattern_span {
            self.faults.extend(pattern::semantic_faults(
                &parsed,
                !self.annotations.is_empty(),
                boundary,
            ));
        }

        for (i, span) in self.declarations.iter().enumerate() {
            let Some(name) = span.subject.term_name() else {
                continue;
            };
            let duplicate = self.declarations[..i]
                .iter()
                .any(|prev| prev.subject.term_name() == Some(name));
            if duplicate {
                self.faults
                    .push(Fault::at(FaultCode::DuplicateDeclaration, span.boundary));
            }
        }
    }
}
