//! Character boundaries within one statement's text.

use std::fmt;

/// Half-open byte range `[start, end)` within a single line.
///
/// Boundaries never cross a line terminator; a [`crate::Subject`] paired
/// with a boundary forms a full span as owned by a statement.
///
/// Layout: 8 bytes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[repr(C)]
pub struct Boundary {
    pub start: u32,
    pub end: u32,
}

impl Boundary {
    /// Create a new boundary.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Boundary { start, end }
    }

    /// Length in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Check if the boundary covers zero bytes.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if a byte offset falls inside this boundary.
    #[inline]
    pub fn contains(&self, offset: u32) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Check if two boundaries share any byte positions.
    #[inline]
    pub fn overlaps(&self, other: Boundary) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Merge two boundaries into one covering both.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Boundary) -> Boundary {
        Boundary {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Slice the covered text out of a line.
    #[inline]
    pub fn text<'a>(&self, line: &'a str) -> &'a str {
        &line[self.start as usize..self.end as usize]
    }
}

impl fmt::Debug for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

crate::static_assert_size!(Boundary, 8);
