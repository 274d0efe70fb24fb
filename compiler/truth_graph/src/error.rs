//! Contract errors: fatal misuse of the API, as opposed to faults, which
//! are data describing malformed source content.

use crate::document::DocumentId;

/// Programmer-level misuse of the mutation or query API.
///
/// A contract error aborts the calling operation and leaves the program
/// unchanged. Malformed source *content* never produces one of these; it
/// becomes a [`truth_diagnostic::Fault`] on the affected statement instead.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ContractError {
    #[error("document {0:?} is read-only")]
    ReadOnlyDocument(DocumentId),

    #[error("line {line} is out of range (document has {len} lines)")]
    LineOutOfRange { line: usize, len: usize },

    #[error("unknown document handle")]
    UnknownDocument,

    #[error("not a recognized document uri: {0}")]
    UnrecognizedUri(String),

    #[error("delete ranges overlap within one transaction")]
    OverlappingDeletes,

    #[error("line {line} is updated and deleted in the same transaction")]
    UpdateOfDeletedLine { line: usize },

    #[error("lifecycle operation on a hypothetical phrase")]
    HypotheticalPhrase,

    #[error("internal invariant violated: {0}")]
    InternalInvariant(&'static str),
}
