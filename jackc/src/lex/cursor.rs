//! Character scanner.
use itertools::{multipeek, MultiPeek};
use std::str::CharIndices;

/// Character returned when the cursor has moved past the last character.
pub const EOF_CHAR: char = '\0';

/// Wrapper for source code that keeps a cursor position and line count.
pub struct Cursor<'a> {
    /// Iterator over UTF-8 encoded source code.
    ///
    /// `MultiPeek` buffers lookahead, because UTF-8 characters
    /// are variable in width and can't be indexed directly.
    chars: MultiPeek<CharIndices<'a>>,
    /// Byte position and value of the current character.
    current: (usize, char),
    /// Number of bytes in the source.
    len: usize,
    /// Line of the current character.
    line: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: multipeek(source.char_indices()),
            current: (0, EOF_CHAR),
            len: source.len(),
            line: 1,
        }
    }

    /// Advance the cursor and return the new current character.
    ///
    /// Moving past a newline increments the line counter, so the
    /// newline character itself belongs to the line it terminates.
    pub fn next(&mut self) -> char {
        if self.current.1 == '\n' && self.current.0 < self.len {
            self.line += 1;
        }

        match self.chars.next() {
            Some((index, c)) => self.current = (index, c),
            // There is no end-of-file character, so park the cursor
            // one past the last byte.
            None => self.current = (self.len, EOF_CHAR),
        }

        self.current.1
    }

    #[inline]
    pub fn current(&self) -> char {
        self.current.1
    }

    /// Character after the current one, without advancing.
    pub fn peek(&mut self) -> char {
        self.chars.reset_peek();
        let c = self.chars.peek().map(|(_, c)| *c).unwrap_or(EOF_CHAR);
        self.chars.reset_peek();
        c
    }

    /// Byte offset of the current character.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.current.0 as u32
    }

    /// Byte offset of the character after the current one.
    pub fn peek_offset(&mut self) -> u32 {
        self.chars.reset_peek();
        let offset = self.chars.peek().map(|(i, _)| *i).unwrap_or(self.len);
        self.chars.reset_peek();
        offset as u32
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Source can contain '\0' characters without being at the end.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.current.0 >= self.len
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cursor_walk() {
        let mut cursor = Cursor::new("a\nb");
        assert_eq!(cursor.next(), 'a');
        assert_eq!(cursor.line(), 1);
        assert_eq!(cursor.peek(), '\n');
        assert_eq!(cursor.next(), '\n');
        assert_eq!(cursor.line(), 1);
        assert_eq!(cursor.next(), 'b');
        assert_eq!(cursor.line(), 2);
        assert_eq!(cursor.peek_offset(), 3);
        assert_eq!(cursor.next(), EOF_CHAR);
        assert!(cursor.at_end());
        assert_eq!(cursor.next(), EOF_CHAR);
        assert_eq!(cursor.line(), 2);
    }
}
