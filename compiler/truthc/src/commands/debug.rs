//! The `parse` command: dump each statement's parsed structure.

use truth_ir::{StatementFlags, Subject, TermInterner};
use truth_parse::{parse_statement, Span, Statement};

use super::read_file;

/// Parse a file line by line and print what the parser derived.
pub fn parse_file(path: &str) {
    let content = read_file(path);
    let interner = TermInterner::new();

    for (index, line) in content.lines().enumerate() {
        let statement = parse_statement(line, &interner);
        println!("{:>4} | {line}", index + 1);
        print_statement(&statement);
    }
}

fn print_statement(statement: &Statement) {
    let flags = statement.flags();
    if flags.contains(StatementFlags::WHITESPACE) {
        println!("       whitespace");
        return;
    }
    if flags.contains(StatementFlags::COMMENT) {
        println!("       comment");
        return;
    }
    if flags.contains(StatementFlags::CRUFT) {
        println!("       cruft");
    }

    for span in statement.declarations() {
        println!(
            "       declare {} {:?}",
            describe_subject(span, statement.text()),
            span.boundary
        );
    }
    if let Some(offset) = statement.joint() {
        println!("       joint at byte {offset}");
    }
    for span in statement.annotations() {
        println!(
            "       annotate {} {:?}",
            describe_subject(span, statement.text()),
            span.boundary
        );
    }
    if flags.contains(StatementFlags::HAS_TOTAL_PATTERN) {
        println!("       total pattern");
    } else if flags.contains(StatementFlags::HAS_PARTIAL_PATTERN) {
        println!("       partial pattern");
    }
    for fault in statement.faults() {
        println!(
            "       fault {}: {}",
            fault.code,
            fault.code.description()
        );
    }
}

fn describe_subject(span: &Span, line: &str) -> String {
    match &span.subject {
        Subject::Term(term) if term.is_list => format!("list term '{}'", span.text(line)),
        Subject::Term(_) => format!("term '{}'", span.text(line)),
        Subject::Pattern(_) => format!("pattern '{}'", span.text(line)),
        Subject::Uri(uri) => format!("uri '{uri}'"),
        Subject::Anonymous => "anonymous".to_owned(),
    }
}
