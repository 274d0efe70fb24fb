//! The incremental graph layer of the Truth compiler.
//!
//! A [`Program`] owns a set of [`Document`]s; each document owns its parsed
//! statement list and a [`PhraseArena`] of reference-counted phrase nodes
//! derived from the statements' indentation hierarchy. Edits arrive in
//! batched transactions that invalidate and rebuild only the affected part
//! of the graph.
//!
//! Everything is single-threaded and cooperative: verification work is
//! chunked across explicit [`Program::pump`] calls, and events accumulate
//! in an owned queue until the host drains them.

mod document;
mod error;
mod event;
mod phrase;
mod program;

pub use document::{Document, DocumentId};
pub use error::ContractError;
pub use event::{Event, StatementChange};
pub use phrase::{Fork, PhraseArena, PhraseId, SpanKey, StatementUid};
pub use program::{
    EditBatch, FactBuilder, MapUriReader, NullFactBuilder, NullUriReader, Program, ProgramConfig,
    UriReader, VerifyStage, Zone,
};
