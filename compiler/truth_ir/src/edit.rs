//! Edit descriptions consumed by the document edit-transaction algorithm.

/// One primitive edit against a document's 1-based statement list.
///
/// Line numbers always refer to the document *before* the transaction:
/// deletes are applied first, then inserts, then updates, so a batch can be
/// expressed entirely in pre-edit coordinates.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum LineEdit {
    /// Insert `text` so that it becomes line `line`.
    ///
    /// `line` may be one past the current last line to append.
    Insert { line: u32, text: String },
    /// Replace the text of line `line`.
    Update { line: u32, text: String },
    /// Delete `count` lines starting at line `line`.
    Delete { line: u32, count: u32 },
}

impl LineEdit {
    /// Convenience constructor for an insert.
    pub fn insert(line: u32, text: impl Into<String>) -> Self {
        LineEdit::Insert {
            line,
            text: text.into(),
        }
    }

    /// Convenience constructor for an update.
    pub fn update(line: u32, text: impl Into<String>) -> Self {
        LineEdit::Update {
            line,
            text: text.into(),
        }
    }

    /// Convenience constructor for a delete.
    pub const fn delete(line: u32, count: u32) -> Self {
        LineEdit::Delete { line, count }
    }

    /// First pre-edit line this edit touches.
    pub const fn line(&self) -> u32 {
        match self {
            LineEdit::Insert { line, .. }
            | LineEdit::Update { line, .. }
            | LineEdit::Delete { line, .. } => *line,
        }
    }
}

/// An editor-style range edit: replace the text between two
/// (line, column) positions with `text`.
///
/// Lines are 1-based, columns are 0-based byte offsets, both inclusive of
/// the start and exclusive of the end position.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RangeEdit {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub text: String,
}

impl RangeEdit {
    pub fn new(
        start_line: u32,
        start_col: u32,
        end_line: u32,
        end_col: u32,
        text: impl Into<String>,
    ) -> Self {
        RangeEdit {
            start_line,
            start_col,
            end_line,
            end_col,
            text: text.into(),
        }
    }

    /// True when the edit removes nothing.
    pub fn is_pure_insert(&self) -> bool {
        self.start_line == self.end_line && self.start_col == self.end_col
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn line_accessor() {
        assert_eq!(LineEdit::insert(3, "x").line(), 3);
        assert_eq!(LineEdit::update(7, "x").line(), 7);
        assert_eq!(LineEdit::delete(2, 4).line(), 2);
    }

    #[test]
    fn hashable() {
        let mut set = HashSet::new();
        set.insert(LineEdit::delete(1, 1));
        set.insert(LineEdit::delete(1, 1));
        set.insert(LineEdit::delete(2, 1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn pure_insert_detection() {
        assert!(RangeEdit::new(1, 4, 1, 4, "abc").is_pure_insert());
        assert!(!RangeEdit::new(1, 0, 2, 0, "").is_pure_insert());
    }
}
