//! Statement flag set.

use bitflags::bitflags;

bitflags! {
    /// Bit flags describing one statement's parse outcome.
    ///
    /// The original design tracked these as independent booleans; a closed
    /// flag set keeps the no-op test a single mask check.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct StatementFlags: u16 {
        /// The line holds nothing but whitespace.
        const WHITESPACE = 1 << 0;
        /// The line is a comment.
        const COMMENT = 1 << 1;
        /// The line failed to parse; excluded from graph construction.
        const CRUFT = 1 << 2;
        /// A bare joint with nothing on either side.
        const VACUOUS = 1 << 3;
        /// The sole declaration is a URI.
        const HAS_URI = 1 << 4;
        /// The sole declaration is a pattern.
        const HAS_PATTERN = 1 << 5;
        /// Pattern must match an entire candidate string.
        const HAS_TOTAL_PATTERN = 1 << 6;
        /// Pattern may match a substring.
        const HAS_PARTIAL_PATTERN = 1 << 7;
        /// The statement has been detached from its document.
        const DISPOSED = 1 << 8;
    }
}

impl StatementFlags {
    /// True when the statement contributes nothing to phrase construction.
    #[inline]
    pub fn is_noop(self) -> bool {
        self.intersects(Self::WHITESPACE | Self::COMMENT | Self::CRUFT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_classification() {
        assert!(StatementFlags::WHITESPACE.is_noop());
        assert!(StatementFlags::COMMENT.is_noop());
        assert!(StatementFlags::CRUFT.is_noop());
        assert!(!StatementFlags::VACUOUS.is_noop());
        assert!(!StatementFlags::empty().is_noop());
        assert!((StatementFlags::CRUFT | StatementFlags::HAS_PATTERN).is_noop());
    }
}
