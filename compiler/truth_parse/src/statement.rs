//! One physical line's parse result.

use std::fmt;
use std::hash::Hasher;

use smallvec::SmallVec;
use truth_diagnostic::Fault;
use truth_ir::{Boundary, ClarifierKey, KnownUri, Name, StatementFlags, Subject};

/// A declared or annotated subject at a boundary within one statement.
#[derive(Clone, PartialEq, Debug)]
pub struct Span {
    pub boundary: Boundary,
    pub subject: Subject,
}

impl Span {
    pub fn new(boundary: Boundary, subject: Subject) -> Self {
        Span { boundary, subject }
    }

    /// The trimmed source text this span covers.
    pub fn text<'a>(&self, line: &'a str) -> &'a str {
        self.boundary.text(line).trim()
    }
}

/// Most statements declare one or two subjects.
pub type SpanList = SmallVec<[Span; 2]>;

/// One physical line: raw text plus everything the parser derived from it.
///
/// Immutable once constructed; an edit replaces the statement rather than
/// mutating it. Disposal is a flag flip done by the owning document when
/// the statement is detached.
#[derive(Clone, PartialEq, Debug)]
pub struct Statement {
    text: String,
    indent: u32,
    declarations: SpanList,
    annotations: SpanList,
    /// Byte offset of the joint operator, when present.
    joint: Option<u32>,
    flags: StatementFlags,
    faults: Vec<Fault>,
    /// The embedded URI subject, when the statement declares one.
    uri: Option<KnownUri>,
    /// Raw annotation-side text, whitespace-trimmed. Total patterns match
    /// against this.
    sum: String,
    /// Canonical key of the annotation term set.
    clarifier: ClarifierKey,
    /// Identity hash for pattern statements: pattern source + clarifier.
    pattern_hash: Option<u64>,
}

impl Statement {
    #[expect(clippy::too_many_arguments, reason = "assembled in one place by the parser")]
    pub(crate) fn assemble(
        text: String,
        indent: u32,
        declarations: SpanList,
        annotations: SpanList,
        joint: Option<u32>,
        flags: StatementFlags,
        faults: Vec<Fault>,
        uri: Option<KnownUri>,
        sum: String,
    ) -> Self {
        let clarifier = ClarifierKey::of(&annotation_names(&annotations));
        let pattern_hash = pattern_hash(&text, &declarations, &sum);
        Statement {
            text,
            indent,
            declarations,
            annotations,
            joint,
            flags,
            faults,
            uri,
            sum,
            clarifier,
            pattern_hash,
        }
    }

    /// Raw source text of the line.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Count of leading whitespace characters.
    pub fn indent(&self) -> u32 {
        self.indent
    }

    /// Declaration spans, left of the joint.
    pub fn declarations(&self) -> &[Span] {
        &self.declarations
    }

    /// Annotation spans, right of the joint.
    pub fn annotations(&self) -> &[Span] {
        &self.annotations
    }

    /// Byte offset of the joint operator, when present.
    pub fn joint(&self) -> Option<u32> {
        self.joint
    }

    pub fn flags(&self) -> StatementFlags {
        self.flags
    }

    /// Frozen list of parse faults.
    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }

    /// True when the statement has at least one error-severity fault.
    pub fn has_fault(&self) -> bool {
        self.faults
            .iter()
            .any(|f| f.severity() == truth_diagnostic::Severity::Error)
    }

    /// The embedded URI subject, when one was declared.
    pub fn uri(&self) -> Option<&KnownUri> {
        self.uri.as_ref()
    }

    /// Concatenated annotation text, the match target for total patterns.
    pub fn sum(&self) -> &str {
        &self.sum
    }

    /// Canonical key of the annotation term set.
    pub fn clarifier(&self) -> ClarifierKey {
        self.clarifier
    }

    /// Identity hash for pattern statements.
    pub fn pattern_hash(&self) -> Option<u64> {
        self.pattern_hash
    }

    /// True when the statement contributes nothing to phrase construction.
    pub fn is_noop(&self) -> bool {
        self.flags.is_noop()
    }

    /// Names of all annotation terms, in source order.
    pub fn annotation_names(&self) -> Vec<Name> {
        annotation_names(&self.annotations)
    }

    /// Flip the disposed flag. Called by the owning document only.
    pub(crate) fn mark_disposed(&mut self) {
        self.flags |= StatementFlags::DISPOSED;
    }

    /// True once the statement has been detached from its document.
    pub fn is_disposed(&self) -> bool {
        self.flags.contains(StatementFlags::DISPOSED)
    }
}

fn annotation_names(annotations: &[Span]) -> Vec<Name> {
    annotations
        .iter()
        .filter_map(|span| span.subject.term_name())
        .collect()
}

fn pattern_hash(text: &str, declarations: &[Span], sum: &str) -> Option<u64> {
    let pattern_span = declarations
        .iter()
        .find(|span| matches!(span.subject, Subject::Pattern(_)))?;
    // The default hasher is enough here: the hash only needs to be stable
    // within one process, matching patterns across documents in one Program.
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    hasher.write(pattern_span.text(text).as_bytes());
    hasher.write(sum.as_bytes());
    Some(hasher.finish())
}

impl fmt::Display for Statement {
    /// Canonical re-serialization.
    ///
    /// No-op statements reproduce their raw text. Operational statements
    /// canonicalize whitespace around the joint and combinators; re-parsing
    /// the output yields an equal span structure.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.flags.is_noop() {
            return f.write_str(&self.text);
        }

        let indent_end = self
            .text
            .char_indices()
            .find(|&(_, c)| c != ' ' && c != '\t')
            .map_or(self.text.len(), |(i, _)| i);
        f.write_str(&self.text[..indent_end])?;

        let mut wrote_decl = false;
        for span in &self.declarations {
            if span.subject.is_anonymous() {
                continue;
            }
            if wrote_decl {
                f.write_str(", ")?;
            }
            f.write_str(span.text(&self.text))?;
            wrote_decl = true;
        }

        if self.joint.is_some() {
            if wrote_decl {
                f.write_str(" ")?;
            }
            f.write_str(":")?;
            for (i, span) in self.annotations.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                f.write_str(" ")?;
                f.write_str(span.text(&self.text))?;
            }
        }
        Ok(())
    }
}
