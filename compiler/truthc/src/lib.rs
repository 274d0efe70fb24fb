//! Truth Compiler CLI library.
//!
//! The binary in `main.rs` dispatches to [`commands`]; everything else
//! lives here so command logic stays testable.

use std::sync::Once;

pub mod commands;
pub mod reader;

static TRACING_INIT: Once = Once::new();

/// Initialize hierarchical tracing output for the CLI.
///
/// Call once at startup. Only activates when `RUST_LOG` is set, e.g.
/// `RUST_LOG=truth_graph=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
                .with(filter)
                .init();
        }
    });
}
