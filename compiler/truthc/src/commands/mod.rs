//! CLI command implementations.
//!
//! Each command is a free function taking its pre-parsed arguments;
//! `main.rs` owns flag parsing and usage text.

mod check;
mod debug;
mod explain;

pub use check::check_file;
pub use debug::parse_file;
pub use explain::explain_fault;

/// Split a CLI path argument into the document's root directory and its
/// relative URI.
///
/// `docs/animals.truth` becomes root `docs` plus uri `./animals.truth`, so
/// references inside the document resolve against the same directory.
pub(crate) fn split_path_arg(path: &str) -> Option<(String, String)> {
    if !path.ends_with(truth_ir::TRUTH_EXTENSION) {
        return None;
    }
    let (dir, file) = match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => (".", path),
    };
    Some((dir.to_owned(), format!("./{file}")))
}

/// Read a file from disk, exiting with a user-friendly error message on
/// failure.
pub(super) fn read_file(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            let msg = match e.kind() {
                std::io::ErrorKind::NotFound => format!("cannot find file '{path}'"),
                std::io::ErrorKind::PermissionDenied => {
                    format!("permission denied reading '{path}'")
                }
                std::io::ErrorKind::InvalidData => {
                    format!("'{path}' contains invalid UTF-8 data")
                }
                _ => format!("error reading '{path}': {e}"),
            };
            eprintln!("{msg}");
            std::process::exit(1);
        }
    }
}
