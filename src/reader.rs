use std::collections::VecDeque;

use crate::error::Position;

/// Character cursor over a source text. Normalizes `\r\n` and bare `\r`
/// to `\n`, tracks the position of the last consumed character, and
/// supports arbitrary lookahead without consuming.
pub struct SourceReader {
    input: std::vec::IntoIter<char>,
    lookahead: VecDeque<char>,
    line: u32,
    column: u32,
}

impl SourceReader {
    pub fn new(source: &str) -> Self {
        Self {
            input: source.chars().collect::<Vec<_>>().into_iter(),
            lookahead: VecDeque::new(),
            line: 1,
            column: 0,
        }
    }

    /// Consumes and returns the next character, or `None` at end of input.
    pub fn get_char(&mut self) -> Option<char> {
        let mut ch = self.next_raw()?;
        if ch == '\r' {
            if self.peek_char(1) == Some('\n') {
                self.next_raw();
            }
            ch = '\n';
        }
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Looks `k` characters ahead (1-based) without consuming anything.
    /// Lookahead sees raw characters; newline normalization happens on
    /// consumption.
    pub fn peek_char(&mut self, k: usize) -> Option<char> {
        if k == 0 {
            return None;
        }
        while self.lookahead.len() < k {
            match self.input.next() {
                Some(c) => self.lookahead.push_back(c),
                None => break,
            }
        }
        self.lookahead.get(k - 1).copied()
    }

    /// Position of the most recently consumed character. Before any
    /// consumption this is line 1, column 0.
    pub fn current_pos(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn next_raw(&mut self) -> Option<char> {
        self.lookahead.pop_front().or_else(|| self.input.next())
    }
}
