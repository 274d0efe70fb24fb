//! Filesystem-backed document reader for the CLI.

use std::path::PathBuf;

use truth_graph::UriReader;
use truth_ir::KnownUri;

/// Resolves relative URIs against a root directory on disk.
///
/// Network protocols are never fetched by the CLI; an `http(s)` reference
/// simply fails to resolve and surfaces as an unresolved-reference fault.
pub struct FsUriReader {
    root: PathBuf,
}

impl FsUriReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsUriReader { root: root.into() }
    }
}

impl UriReader for FsUriReader {
    fn read(&mut self, uri: &KnownUri) -> Option<String> {
        if !uri.protocol.is_relative() {
            return None;
        }
        let path = self.root.join(&uri.raw);
        match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "reference read failed");
                None
            }
        }
    }
}
