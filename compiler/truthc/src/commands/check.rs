//! The `check` command: load a document, resolve its references, verify
//! the phrase graph and report every fault.

use truth_diagnostic::{count_by_severity, FaultEmitter, TerminalEmitter};
use truth_graph::{NullFactBuilder, Program, ProgramConfig};

use super::split_path_arg;
use crate::reader::FsUriReader;

/// Check one document and everything it references.
///
/// Accumulates all faults before exiting so the user sees the complete
/// picture rather than the first problem only.
pub fn check_file(path: &str) {
    let Some((root, uri)) = split_path_arg(path) else {
        eprintln!("error: '{path}' does not name a .truth document");
        std::process::exit(1);
    };

    let mut program = Program::with_collaborators(
        ProgramConfig::default(),
        Box::new(FsUriReader::new(root)),
        Box::new(NullFactBuilder),
    );

    let document = match program.load(&uri) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    // Drive the verification cycle to completion before reporting.
    while program.pump() {}

    let faults = match program.faults(document) {
        Ok(faults) => faults,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let mut emitter = TerminalEmitter::stderr();
    for fault in &faults {
        let line_text = program
            .document(document)
            .ok()
            .and_then(|doc| doc.statement(fault.line as usize).ok())
            .map(|statement| statement.text().to_owned());
        emitter.emit(&uri, fault, line_text.as_deref());
    }

    let (errors, advisories) = count_by_severity(&faults);
    emitter.emit_summary(errors, advisories);

    if errors > 0 {
        std::process::exit(1);
    }

    let statement_count = program
        .document(document)
        .map(truth_graph::Document::len)
        .unwrap_or(0);
    println!("OK: {path} ({statement_count} statements, {advisories} advisories)");
}
