//! Cursor-based character reader over one line of text.
//!
//! The scanner underpins the backtracking statement parser: every read
//! either advances past what it matched or leaves the position untouched,
//! and the integer position can be saved and restored to retry an
//! alternative. No operation panics and none signals failure by exception;
//! failure is always "no advance happened".
//!
//! Positions are byte offsets into the line and always sit on UTF-8
//! character boundaries. [`Scanner::read_grapheme`] consumes one code
//! point, so multi-byte characters are never split.

use memchr::memchr;

/// Sequential character access over one line with save/restore.
#[derive(Clone, Copy, Debug)]
pub struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a scanner at position 0.
    pub fn new(text: &'a str) -> Self {
        Scanner { text, pos: 0 }
    }

    /// Current byte position.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Restore a previously saved position.
    ///
    /// The position must come from [`position()`](Self::position) on the
    /// same scanner; it is always a character boundary.
    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        debug_assert!(pos <= self.text.len(), "position out of bounds");
        debug_assert!(self.text.is_char_boundary(pos), "position splits a character");
        self.pos = pos;
    }

    /// The unconsumed remainder of the line.
    #[inline]
    pub fn remaining(&self) -> &'a str {
        &self.text[self.pos..]
    }

    /// True at end of input or at the line terminator.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.remaining().bytes().next(), None | Some(b'\n'))
    }

    /// If the upcoming text equals `literal`, advance past it and return
    /// true. No side effect on failure.
    pub fn read(&mut self, literal: &str) -> bool {
        if self.remaining().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    /// Like [`read`](Self::read), but additionally requires that the line
    /// ends immediately after the literal.
    pub fn read_then_terminal(&mut self, literal: &str) -> bool {
        let saved = self.pos;
        if self.read(literal) && self.is_terminal() {
            true
        } else {
            self.pos = saved;
            false
        }
    }

    /// Non-consuming equivalent of [`read`](Self::read).
    pub fn peek(&self, literal: &str) -> bool {
        self.remaining().starts_with(literal)
    }

    /// Non-consuming equivalent of
    /// [`read_then_terminal`](Self::read_then_terminal).
    pub fn peek_then_terminal(&self, literal: &str) -> bool {
        match self.remaining().strip_prefix(literal) {
            Some(rest) => matches!(rest.bytes().next(), None | Some(b'\n')),
            None => false,
        }
    }

    /// Consume leading spaces and tabs, returning how many were consumed.
    pub fn read_whitespace(&mut self) -> usize {
        let count = self
            .remaining()
            .bytes()
            .take_while(|&b| b == b' ' || b == b'\t')
            .count();
        self.pos += count;
        count
    }

    /// Consume and return one code point, or `None` at the terminal.
    pub fn read_grapheme(&mut self) -> Option<char> {
        if self.is_terminal() {
            return None;
        }
        let c = self.remaining().chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Look at the next code point without consuming it.
    pub fn peek_grapheme(&self) -> Option<char> {
        if self.is_terminal() {
            return None;
        }
        self.remaining().chars().next()
    }

    /// Consume characters up to (not including) the next occurrence of
    /// `delimiter`, or to the terminal when absent. Returns the consumed
    /// text.
    pub fn read_until(&mut self, delimiter: Option<char>) -> &'a str {
        let rest = self.remaining();
        let line_end = memchr(b'\n', rest.as_bytes()).unwrap_or(rest.len());
        let stop = match delimiter {
            Some(d) if d.is_ascii() => {
                memchr(d as u8, rest.as_bytes()).map_or(line_end, |i| i.min(line_end))
            }
            Some(d) => rest.find(d).map_or(line_end, |i| i.min(line_end)),
            None => line_end,
        };
        let consumed = &rest[..stop];
        self.pos += stop;
        consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn read_advances_only_on_match() {
        let mut scanner = Scanner::new("animal : mammal");
        assert!(!scanner.read("mammal"));
        assert_eq!(scanner.position(), 0);
        assert!(scanner.read("animal"));
        assert_eq!(scanner.position(), 6);
    }

    #[test]
    fn read_then_terminal_requires_line_end() {
        let mut scanner = Scanner::new("//");
        assert!(scanner.read_then_terminal("//"));

        let mut scanner = Scanner::new("//x");
        assert!(!scanner.read_then_terminal("//"));
        assert_eq!(scanner.position(), 0);
    }

    #[test]
    fn peek_never_moves() {
        let scanner = Scanner::new("abc");
        assert!(scanner.peek("ab"));
        assert!(scanner.peek_then_terminal("abc"));
        assert!(!scanner.peek_then_terminal("ab"));
        assert_eq!(scanner.position(), 0);
    }

    #[test]
    fn whitespace_counting() {
        let mut scanner = Scanner::new("\t\t  x");
        assert_eq!(scanner.read_whitespace(), 4);
        assert_eq!(scanner.remaining(), "x");
        assert_eq!(scanner.read_whitespace(), 0);
    }

    #[test]
    fn grapheme_reads_code_points() {
        let mut scanner = Scanner::new("é𝕏a");
        assert_eq!(scanner.read_grapheme(), Some('é'));
        assert_eq!(scanner.read_grapheme(), Some('𝕏'));
        assert_eq!(scanner.read_grapheme(), Some('a'));
        assert_eq!(scanner.read_grapheme(), None);
    }

    #[test]
    fn read_until_delimiter() {
        let mut scanner = Scanner::new("abc,def");
        assert_eq!(scanner.read_until(Some(',')), "abc");
        assert_eq!(scanner.remaining(), ",def");
    }

    #[test]
    fn read_until_missing_delimiter() {
        let mut scanner = Scanner::new("abcdef");
        assert_eq!(scanner.read_until(Some(',')), "abcdef");
        assert!(scanner.is_terminal());
    }

    #[test]
    fn read_until_stops_at_line_terminator() {
        let mut scanner = Scanner::new("abc\ndef");
        assert_eq!(scanner.read_until(None), "abc");
        assert!(scanner.is_terminal());
    }

    #[test]
    fn save_restore_round_trip() {
        let mut scanner = Scanner::new("alpha beta");
        let saved = scanner.position();
        assert!(scanner.read("alpha"));
        scanner.set_position(saved);
        assert_eq!(scanner.remaining(), "alpha beta");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn grapheme_walk_consumes_everything(s in "\\PC{0,40}") {
                let mut scanner = Scanner::new(&s);
                let mut collected = String::new();
                while let Some(c) = scanner.read_grapheme() {
                    collected.push(c);
                }
                prop_assert_eq!(collected, s);
            }

            #[test]
            fn failed_read_never_moves(s in "\\PC{0,40}", lit in "\\PC{1,8}") {
                let mut scanner = Scanner::new(&s);
                let before = scanner.position();
                let matched = scanner.read(&lit);
                if !matched {
                    prop_assert_eq!(scanner.position(), before);
                }
            }

            #[test]
            fn positions_are_char_boundaries(s in "\\PC{0,40}") {
                let mut scanner = Scanner::new(&s);
                loop {
                    prop_assert!(s.is_char_boundary(scanner.position()));
                    if scanner.read_grapheme().is_none() {
                        break;
                    }
                }
            }
        }
    }
}
