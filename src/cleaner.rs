use crate::config::Config;
use crate::error::{LexError, Position};
use crate::reader::SourceReader;

/// Sits between the reader and the lexer: strips whitespace and
/// `/* ... */` block comments, yielding only significant characters
/// together with their positions.
pub struct Cleaner {
    reader: SourceReader,
    max_comment_length: usize,
}

impl Cleaner {
    pub fn new(reader: SourceReader, config: &Config) -> Self {
        Self {
            reader,
            max_comment_length: config.max_comment_length,
        }
    }

    /// Next significant character, or `None` at end of input.
    pub fn next_significant(&mut self) -> Result<Option<(char, Position)>, LexError> {
        loop {
            let Some(ch) = self.reader.get_char() else {
                return Ok(None);
            };
            if ch.is_whitespace() {
                continue;
            }
            if ch == '/' && self.reader.peek_char(1) == Some('*') {
                self.reader.get_char();
                self.skip_comment_body()?;
                continue;
            }
            return Ok(Some((ch, self.reader.current_pos())));
        }
    }

    /// Raw passthrough for token continuation characters (identifier
    /// tails, string bodies, digits). No whitespace or comment handling.
    pub fn next_raw(&mut self) -> Option<(char, Position)> {
        let ch = self.reader.get_char()?;
        Some((ch, self.reader.current_pos()))
    }

    pub fn peek_raw(&mut self, k: usize) -> Option<char> {
        self.reader.peek_char(k)
    }

    pub fn pos(&self) -> Position {
        self.reader.current_pos()
    }

    /// Consumes a comment body up to and including the closing `*/`.
    /// The opening `/*` must already be consumed.
    pub fn skip_comment_body(&mut self) -> Result<(), LexError> {
        let start = self.reader.current_pos();
        let mut length = 0usize;
        loop {
            let Some(inner) = self.reader.get_char() else {
                return Err(LexError::UnterminatedComment { pos: start });
            };
            if inner == '*' && self.reader.peek_char(1) == Some('/') {
                self.reader.get_char();
                return Ok(());
            }
            if length == self.max_comment_length {
                return Err(LexError::CommentTooLong {
                    limit: self.max_comment_length,
                    pos: start,
                });
            }
            length += 1;
        }
    }
}
