//! Fault reporting for the Truth compiler.
//!
//! Faults are the recoverable, data-level error channel: malformed or
//! semantically invalid source attached to a precise location. They never
//! abort the surrounding operation — a document with faulty lines still
//! loads. The fatal, contract-level channel lives in `truth_graph` as
//! `ContractError`.

mod emitter;
mod fault;
mod queue;

pub use emitter::{count_by_severity, FaultEmitter, TerminalEmitter};
pub use fault::{Fault, FaultCode, LocatedFault, Severity};
pub use queue::{FaultConfig, FaultQueue};
