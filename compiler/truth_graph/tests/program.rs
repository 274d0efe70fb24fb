//! End-to-end tests over the public program API.

use pretty_assertions::assert_eq;
use truth_diagnostic::{FaultCode, FaultConfig};
use truth_graph::{
    DocumentId, Event, MapUriReader, NullFactBuilder, Program, ProgramConfig, StatementChange,
    VerifyStage, Zone,
};
use truth_ir::RangeEdit;

fn quiet_config() -> ProgramConfig {
    ProgramConfig {
        auto_verify: false,
        ..ProgramConfig::default()
    }
}

fn program_with(text: &str) -> (Program, DocumentId) {
    let mut program = Program::new(quiet_config());
    let doc = match program.create_document(text) {
        Ok(doc) => doc,
        Err(e) => panic!("create failed: {e}"),
    };
    let _ = program.take_events();
    (program, doc)
}

fn document_text(program: &Program, doc: DocumentId) -> String {
    match program.document(doc) {
        Ok(d) => d
            .statements()
            .map(|s| s.text().to_owned())
            .collect::<Vec<_>>()
            .join("\n"),
        Err(e) => panic!("document missing: {e}"),
    }
}

#[test]
fn create_emits_events_and_phrases() {
    let mut program = Program::new(quiet_config());
    let doc = match program.create_document("A\n\tB : A") {
        Ok(doc) => doc,
        Err(e) => panic!("create failed: {e}"),
    };

    let events = program.take_events();
    assert!(matches!(events[0], Event::DocumentCreate { document } if document == doc));
    let declares = events
        .iter()
        .filter(|e| matches!(e, Event::Declare { .. }))
        .count();
    assert_eq!(declares, 2);

    let Ok(found) = program.query(doc, &["A", "B"]) else {
        panic!("query failed");
    };
    assert_eq!(found.len(), 1);
    let Ok(missing) = program.query(doc, &["B"]) else {
        panic!("query failed");
    };
    assert!(missing.is_empty());
}

#[test]
fn cruft_scenario() {
    let (program, doc) = program_with(",A");

    let Ok(faults) = program.faults(doc) else {
        panic!("faults failed");
    };
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].line, 1);
    assert_eq!(faults[0].fault.code, FaultCode::StatementBeginsWithComma);

    let Ok(found) = program.query(doc, &["A"]) else {
        panic!("query failed");
    };
    assert!(found.is_empty());
}

#[test]
fn fault_limit_caps_errors() {
    let mut program = Program::new(ProgramConfig {
        auto_verify: false,
        faults: FaultConfig {
            error_limit: 2,
            deduplicate: true,
        },
        ..ProgramConfig::default()
    });
    let doc = match program.create_document(",A\n,B\n,C") {
        Ok(doc) => doc,
        Err(e) => panic!("create failed: {e}"),
    };
    let Ok(faults) = program.faults(doc) else {
        panic!("faults failed");
    };
    assert_eq!(faults.len(), 2);
}

#[test]
fn edit_updates_graph_and_events() {
    let (mut program, doc) = program_with("A\n\tB : A");

    let outcome = program.edit(doc, |tx| tx.update(2, "\tC : A"));
    assert_eq!(outcome, Ok(()));

    let events = program.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        Event::StatementChange {
            change: StatementChange::Update { line: 2 },
            ..
        }
    )));

    let Ok(old) = program.query(doc, &["A", "B"]) else {
        panic!("query failed");
    };
    assert!(old.is_empty());
    let Ok(new) = program.query(doc, &["A", "C"]) else {
        panic!("query failed");
    };
    assert_eq!(new.len(), 1);
}

#[test]
fn renaming_a_parent_rekeys_its_descendants() {
    let (mut program, doc) = program_with("A\n\tB");

    let outcome = program.edit(doc, |tx| tx.update(1, "C"));
    assert_eq!(outcome, Ok(()));

    let Ok(moved) = program.query(doc, &["C", "B"]) else {
        panic!("query failed");
    };
    assert_eq!(moved.len(), 1);
    let Ok(orphaned) = program.query(doc, &["A", "B"]) else {
        panic!("query failed");
    };
    assert!(orphaned.is_empty());
}

#[test]
fn reclarifying_a_parent_rekeys_its_descendants() {
    let (mut program, doc) = program_with("A : x\n\tB");

    let outcome = program.edit(doc, |tx| tx.update(1, "A : y"));
    assert_eq!(outcome, Ok(()));

    let Ok(found) = program.query(doc, &["A", "B"]) else {
        panic!("query failed");
    };
    assert_eq!(found.len(), 1);
}

#[test]
fn query_with_clarifier_distinguishes_homographs() {
    let (program, doc) = program_with("A : x\nA : y");

    let Ok(all) = program.query(doc, &["A"]) else {
        panic!("query failed");
    };
    assert_eq!(all.len(), 2);

    let Ok(exact) = program.query_with_clarifier(doc, &["A"], &["x"]) else {
        panic!("query failed");
    };
    assert_eq!(exact.len(), 1);

    let Ok(none) = program.query_with_clarifier(doc, &["A"], &["z"]) else {
        panic!("query failed");
    };
    assert!(none.is_empty());
}

#[test]
fn outbound_forks_reach_sibling_scope() {
    let (mut program, doc) = program_with("A\nB : A");

    let Ok(b) = program.query(doc, &["B"]) else {
        panic!("query failed");
    };
    assert_eq!(b.len(), 1);
    let Ok(forks) = program.outbounds(doc, b[0]) else {
        panic!("outbounds failed");
    };
    assert_eq!(forks.len(), 1);
    assert_eq!(forks[0].term, program.interner().intern("A"));

    let Ok(a) = program.query(doc, &["A"]) else {
        panic!("query failed");
    };
    assert_eq!(forks[0].targets, a);
}

#[test]
fn delete_then_reinsert_suppresses_churn() {
    let (mut program, doc) = program_with("A");

    let outcome = program.edit(doc, |tx| {
        tx.delete(1, 1);
        tx.insert(1, "A");
    });
    assert_eq!(outcome, Ok(()));

    let events = program.take_events();
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, Event::Declare { .. } | Event::Undeclare { .. })),
        "no declare/undeclare churn expected: {events:?}"
    );
}

#[test]
fn deleting_last_backing_undeclares() {
    let (mut program, doc) = program_with("A");

    let outcome = program.edit(doc, |tx| tx.delete(1, 1));
    assert_eq!(outcome, Ok(()));

    let events = program.take_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::Undeclare { .. })));
}

#[test]
fn edit_atomic_typing_fast_path() {
    let (mut program, doc) = program_with("anim : mammal");

    // Typing two characters at the end of "anim".
    let outcome = program.edit_atomic(doc, &[RangeEdit::new(1, 4, 1, 4, "al")]);
    assert_eq!(outcome, Ok(()));
    assert_eq!(document_text(&program, doc), "animal : mammal");

    let Ok(found) = program.query(doc, &["animal"]) else {
        panic!("query failed");
    };
    assert_eq!(found.len(), 1);
}

#[test]
fn edit_atomic_newline_split() {
    let (mut program, doc) = program_with("AB");

    let outcome = program.edit_atomic(doc, &[RangeEdit::new(1, 1, 1, 1, "\n")]);
    assert_eq!(outcome, Ok(()));
    assert_eq!(document_text(&program, doc), "A\nB");
}

#[test]
fn edit_atomic_whole_line_delete() {
    let (mut program, doc) = program_with("A\nB\nC");

    let outcome = program.edit_atomic(doc, &[RangeEdit::new(2, 0, 3, 0, "")]);
    assert_eq!(outcome, Ok(()));
    assert_eq!(document_text(&program, doc), "A\nC");
}

#[test]
fn inspect_classifies_zones() {
    let (program, doc) = program_with("A, B : x\n\tC");

    assert_eq!(program.inspect(doc, 1, 0), Ok(Zone::Declaration { index: 0 }));
    assert_eq!(program.inspect(doc, 1, 1), Ok(Zone::DeclarationCombinator));
    assert_eq!(program.inspect(doc, 1, 3), Ok(Zone::Declaration { index: 1 }));
    assert_eq!(program.inspect(doc, 1, 5), Ok(Zone::Joint));
    assert_eq!(program.inspect(doc, 1, 7), Ok(Zone::Annotation { index: 0 }));
    assert_eq!(program.inspect(doc, 2, 0), Ok(Zone::Whitespace));
}

#[test]
fn inspect_sees_patterns() {
    let (program, doc) = program_with("/ab/ : x");
    assert_eq!(program.inspect(doc, 1, 1), Ok(Zone::Pattern));
}

#[test]
fn references_resolve_through_reader() {
    let reader = MapUriReader::default()
        .with("./base.truth", "./shared.truth\nA")
        .with("./shared.truth", "S");
    let mut program = Program::with_collaborators(
        quiet_config(),
        Box::new(reader),
        Box::new(NullFactBuilder),
    );

    let base = match program.load("./base.truth") {
        Ok(doc) => doc,
        Err(e) => panic!("load failed: {e}"),
    };
    let Ok(faults) = program.faults(base) else {
        panic!("faults failed");
    };
    assert!(faults.is_empty(), "unexpected faults: {faults:?}");

    let events = program.take_events();
    let creates = events
        .iter()
        .filter(|e| matches!(e, Event::DocumentCreate { .. }))
        .count();
    assert_eq!(creates, 2);
}

#[test]
fn unresolved_reference_faults() {
    let reader = MapUriReader::default().with("./base.truth", "./missing.truth\nA");
    let mut program = Program::with_collaborators(
        quiet_config(),
        Box::new(reader),
        Box::new(NullFactBuilder),
    );

    let base = match program.load("./base.truth") {
        Ok(doc) => doc,
        Err(e) => panic!("load failed: {e}"),
    };
    let Ok(faults) = program.faults(base) else {
        panic!("faults failed");
    };
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].fault.code, FaultCode::UnresolvedReference);
}

#[test]
fn duplicate_reference_is_advisory() {
    let reader = MapUriReader::default()
        .with("./base.truth", "./shared.truth\n./shared.truth")
        .with("./shared.truth", "S");
    let mut program = Program::with_collaborators(
        quiet_config(),
        Box::new(reader),
        Box::new(NullFactBuilder),
    );

    let base = match program.load("./base.truth") {
        Ok(doc) => doc,
        Err(e) => panic!("load failed: {e}"),
    };
    let Ok(faults) = program.faults(base) else {
        panic!("faults failed");
    };
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].fault.code, FaultCode::DuplicateReference);
    assert_eq!(faults[0].line, 2);
}

#[test]
fn insecure_reference_from_secure_document() {
    let reader = MapUriReader::default()
        .with(
            "https://example.com/base.truth",
            "http://example.com/plain.truth\nA",
        )
        .with("http://example.com/plain.truth", "P");
    let mut program = Program::with_collaborators(
        quiet_config(),
        Box::new(reader),
        Box::new(NullFactBuilder),
    );

    let base = match program.load("https://example.com/base.truth") {
        Ok(doc) => doc,
        Err(e) => panic!("load failed: {e}"),
    };
    let Ok(faults) = program.faults(base) else {
        panic!("faults failed");
    };
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].fault.code, FaultCode::InsecureReference);
    assert_eq!(faults[0].line, 1);
}

#[test]
fn cyclic_references_terminate() {
    let reader = MapUriReader::default()
        .with("./a.truth", "./b.truth\nA")
        .with("./b.truth", "./a.truth\nB");
    let mut program = Program::with_collaborators(
        quiet_config(),
        Box::new(reader),
        Box::new(NullFactBuilder),
    );

    let a = match program.load("./a.truth") {
        Ok(doc) => doc,
        Err(e) => panic!("load failed: {e}"),
    };
    let Ok(faults) = program.faults(a) else {
        panic!("faults failed");
    };
    assert!(faults.is_empty(), "cycle must resolve cleanly: {faults:?}");
}

#[test]
fn verification_runs_to_completion() {
    let mut program = Program::new(ProgramConfig {
        auto_verify: true,
        chunk_size: 1,
        ..ProgramConfig::default()
    });
    let _doc = match program.create_document("A\nB\nC") {
        Ok(doc) => doc,
        Err(e) => panic!("create failed: {e}"),
    };
    assert_eq!(program.stage(), VerifyStage::Started);

    let mut pumps = 0;
    while program.pump() {
        pumps += 1;
        assert!(pumps < 1000, "scheduler failed to terminate");
    }
    assert_eq!(program.stage(), VerifyStage::Idle);
    assert_eq!(program.marked_count(), 0);

    let events = program.take_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::VerificationComplete)));
}

#[test]
fn edit_cancels_inflight_verification() {
    let mut program = Program::new(ProgramConfig {
        auto_verify: true,
        chunk_size: 1,
        ..ProgramConfig::default()
    });
    let doc = match program.create_document("A\nB\nC") {
        Ok(doc) => doc,
        Err(e) => panic!("create failed: {e}"),
    };
    // Partially drive the cycle, then edit: the cycle restarts from its
    // marked stage with the enlarged set.
    let _ = program.pump();
    let outcome = program.edit(doc, |tx| tx.update(3, "D"));
    assert_eq!(outcome, Ok(()));
    assert_eq!(program.stage(), VerifyStage::Started);

    let mut pumps = 0;
    while program.pump() {
        pumps += 1;
        assert!(pumps < 1000, "scheduler failed to terminate");
    }
    assert_eq!(program.stage(), VerifyStage::Idle);
}

#[test]
fn remove_document_emits_delete() {
    let (mut program, doc) = program_with("A");
    assert_eq!(program.remove_document(doc), Ok(()));
    let events = program.take_events();
    assert!(matches!(
        events.as_slice(),
        [Event::DocumentDelete { document }] if *document == doc
    ));
    assert!(program.document(doc).is_err());
}
