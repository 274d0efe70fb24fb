//! Events emitted to the host.
//!
//! The program collects events into an owned queue during each operation;
//! the host drains them explicitly with [`Program::take_events`].
//!
//! [`Program::take_events`]: crate::Program::take_events

use truth_ir::{ClarifierKey, Name};

use crate::document::DocumentId;

/// One host-visible occurrence.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Event {
    DocumentCreate {
        document: DocumentId,
    },
    DocumentDelete {
        document: DocumentId,
    },
    DocumentUriChange {
        document: DocumentId,
    },
    /// A phrase came into existence (its first physical backing appeared).
    ///
    /// Suppressed when a statement is deleted and an equivalent one is
    /// re-inserted within the same transaction.
    Declare {
        document: DocumentId,
        subject: Name,
        clarifier: ClarifierKey,
    },
    /// A depth-1 phrase left the forwarding table for good.
    Undeclare {
        document: DocumentId,
        subject: Name,
        clarifier: ClarifierKey,
    },
    StatementChange {
        document: DocumentId,
        change: StatementChange,
    },
    VerificationComplete,
}

/// Detail record for one applied line edit, in the caller's pre-edit
/// coordinates.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum StatementChange {
    Insert { line: usize },
    Update { line: usize },
    Delete { line: usize, count: usize },
}
