//! Fault emitters.
//!
//! The CLI renders faults through [`TerminalEmitter`]; hosts embedding the
//! compiler implement [`FaultEmitter`] themselves.

use std::io::Write;

use crate::{LocatedFault, Severity};

/// Trait for rendering located faults.
pub trait FaultEmitter {
    /// Emit a single fault for the named document.
    fn emit(&mut self, uri: &str, fault: &LocatedFault, line_text: Option<&str>);

    /// Emit multiple faults.
    fn emit_all(&mut self, uri: &str, faults: &[LocatedFault]) {
        for fault in faults {
            self.emit(uri, fault, None);
        }
    }

    /// Emit a closing summary.
    fn emit_summary(&mut self, error_count: usize, advisory_count: usize);
}

/// Human-readable emitter writing to any `Write` sink.
pub struct TerminalEmitter<W: Write> {
    out: W,
}

impl TerminalEmitter<std::io::Stderr> {
    /// Emitter writing to stderr.
    pub fn stderr() -> Self {
        TerminalEmitter {
            out: std::io::stderr(),
        }
    }
}

impl<W: Write> TerminalEmitter<W> {
    /// Emitter writing to an arbitrary sink (used by tests).
    pub fn new(out: W) -> Self {
        TerminalEmitter { out }
    }

    /// Consume the emitter, returning the sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FaultEmitter for TerminalEmitter<W> {
    fn emit(&mut self, uri: &str, fault: &LocatedFault, line_text: Option<&str>) {
        // Rendering failures on a closed pipe are not actionable.
        let _ = writeln!(
            self.out,
            "{}[{}]: {}\n  --> {}:{}",
            fault.fault.severity(),
            fault.fault.code,
            fault.fault.code.description(),
            uri,
            fault.line,
        );
        if let Some(text) = line_text {
            let _ = writeln!(self.out, "   | {text}");
            if let Some(boundary) = fault.fault.boundary {
                let pad = " ".repeat(boundary.start as usize);
                let carets = "^".repeat((boundary.len().max(1)) as usize);
                let _ = writeln!(self.out, "   | {pad}{carets}");
            }
        }
    }

    fn emit_summary(&mut self, error_count: usize, advisory_count: usize) {
        if error_count == 0 && advisory_count == 0 {
            return;
        }
        let _ = writeln!(
            self.out,
            "{error_count} error(s), {advisory_count} advisory(ies)"
        );
    }
}

/// Count errors and advisories in a fault slice.
pub fn count_by_severity(faults: &[LocatedFault]) -> (usize, usize) {
    let errors = faults
        .iter()
        .filter(|f| f.fault.severity() == Severity::Error)
        .count();
    (errors, faults.len() - errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Fault, FaultCode};

    #[test]
    fn terminal_output_shape() {
        let mut emitter = TerminalEmitter::new(Vec::new());
        let fault = LocatedFault {
            line: 2,
            fault: Fault::of(FaultCode::EmptyPattern),
        };
        emitter.emit("./doc.truth", &fault, Some("//"));
        let text = String::from_utf8(emitter.into_inner()).unwrap_or_default();
        assert!(text.contains("error[T201]"));
        assert!(text.contains("./doc.truth:2"));
    }

    #[test]
    fn severity_counts() {
        let faults = vec![
            LocatedFault {
                line: 1,
                fault: Fault::of(FaultCode::EmptyPattern),
            },
            LocatedFault {
                line: 2,
                fault: Fault::of(FaultCode::MixedIndent),
            },
        ];
        assert_eq!(count_by_severity(&faults), (1, 1));
    }
}
