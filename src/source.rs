/// Rewindable character stream over a script.
///
/// Tracks the line number for diagnostics. Only the character just read
/// can be put back; every call site in the lexer un-reads at most one
/// lookahead character.
#[derive(Debug, Clone)]
pub struct CharSource {
    chars: Vec<char>,
    cursor: Cursor,
}

/// Position within a [`CharSource`], small enough to copy into snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub position: usize,
    pub line_number: usize,
}

impl CharSource {
    pub fn new(script: &str) -> Self {
        Self {
            chars: script.chars().collect(),
            cursor: Cursor {
                position: 0,
                line_number: 1,
            },
        }
    }

    /// Next character, or `None` at end of input.
    pub fn next_char(&mut self) -> Option<char> {
        let c = *self.chars.get(self.cursor.position)?;
        self.cursor.position += 1;
        if c == '\n' {
            self.cursor.line_number += 1;
        }
        Some(c)
    }

    /// Un-read `c`, which must be the character returned by the last
    /// `next_char` call.
    pub fn put_back(&mut self, c: char) {
        debug_assert!(self.cursor.position > 0);
        debug_assert_eq!(self.chars.get(self.cursor.position - 1), Some(&c));

        self.cursor.position -= 1;
        if c == '\n' {
            self.cursor.line_number -= 1;
        }
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.cursor.position).copied()
    }

    pub fn position(&self) -> usize {
        self.cursor.position
    }

    pub fn line_number(&self) -> usize {
        self.cursor.line_number
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    pub fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start.min(end)..end.min(self.chars.len())]
            .iter()
            .collect()
    }
}
