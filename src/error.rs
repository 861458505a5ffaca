use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;
use thiserror::Error;

use crate::lexer::TokenKind;

/// 1-based line and column. Column 0 only occurs right after a newline,
/// before any character of the next line has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}, {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn single(pos: Position) -> Self {
        Self { start: pos, end: pos }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("[{pos}] ERROR Unterminated comment.")]
    UnterminatedComment { pos: Position },
    #[error("[{pos}] ERROR Comment exceeds maximum length of {limit} characters.")]
    CommentTooLong { limit: usize, pos: Position },
    #[error("[{pos}] ERROR Unterminated string literal.")]
    UnterminatedString { pos: Position },
    #[error("[{pos}] ERROR String literal exceeds maximum length of {limit} characters.")]
    StringTooLong { limit: usize, pos: Position },
    #[error("[{pos}] ERROR Invalid escape sequence '\\{found}'.")]
    InvalidEscape { found: char, pos: Position },
    #[error("[{pos}] ERROR Identifier exceeds maximum length of {limit} characters.")]
    IdentifierTooLong { limit: usize, pos: Position },
    #[error("[{pos}] ERROR Number literal exceeds maximum length of {limit} characters.")]
    NumberTooLong { limit: usize, pos: Position },
    #[error("[{pos}] ERROR Invalid number literal '{text}'.")]
    InvalidNumber { text: String, pos: Position },
    #[error("[{pos}] ERROR Invalid character '{found}'.")]
    InvalidCharacter { found: char, pos: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnterminatedComment { pos }
            | LexError::CommentTooLong { pos, .. }
            | LexError::UnterminatedString { pos }
            | LexError::StringTooLong { pos, .. }
            | LexError::InvalidEscape { pos, .. }
            | LexError::IdentifierTooLong { pos, .. }
            | LexError::NumberTooLong { pos, .. }
            | LexError::InvalidNumber { pos, .. }
            | LexError::InvalidCharacter { pos, .. } => *pos,
        }
    }

    pub fn report(&self, source: &str, filename: Option<&str>) {
        emit_report(
            "Lexical Error",
            Color::Red,
            &self.to_string(),
            Some(self.position()),
            source,
            filename,
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("[{pos}] ERROR Expected {expected} but found {found}.")]
    UnexpectedToken {
        expected: TokenKind,
        found: TokenKind,
        pos: Position,
    },
    #[error("[{pos}] ERROR {message}")]
    Message { message: String, pos: Position },
}

impl ParseError {
    pub fn message(message: impl Into<String>, pos: Position) -> Self {
        ParseError::Message {
            message: message.into(),
            pos,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            ParseError::UnexpectedToken { pos, .. } | ParseError::Message { pos, .. } => *pos,
        }
    }

    pub fn report(&self, source: &str, filename: Option<&str>) {
        emit_report(
            "Parse Error",
            Color::Yellow,
            &self.to_string(),
            Some(self.position()),
            source,
            filename,
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{pos}] ERROR {message}")]
pub struct TypeError {
    pub message: String,
    pub pos: Position,
}

impl TypeError {
    pub fn new(message: impl Into<String>, pos: Position) -> Self {
        Self {
            message: message.into(),
            pos,
        }
    }

    pub fn report(&self, source: &str, filename: Option<&str>) {
        emit_report(
            "Type Error",
            Color::Cyan,
            &self.to_string(),
            Some(self.pos),
            source,
            filename,
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub message: String,
    pub pos: Option<Position>,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            pos: None,
        }
    }

    pub fn at(message: impl Into<String>, pos: Position) -> Self {
        Self {
            message: message.into(),
            pos: Some(pos),
        }
    }

    /// Attaches a position if the error does not already carry one.
    pub fn with_pos(mut self, pos: Position) -> Self {
        if self.pos.is_none() {
            self.pos = Some(pos);
        }
        self
    }

    pub fn report(&self, source: &str, filename: Option<&str>) {
        emit_report(
            "Runtime Error",
            Color::Magenta,
            &self.to_string(),
            self.pos,
            source,
            filename,
        );
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.pos {
            Some(pos) => write!(f, "[{}] ERROR {}", pos, self.message),
            None => write!(f, "[?, ?] ERROR {}", self.message),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Byte offset of a line/column position inside `source`. Falls back to the
/// end of the source when the position lies past it.
fn byte_offset(source: &str, pos: Position) -> usize {
    let mut line_start = 0;
    let mut remaining = pos.line.saturating_sub(1);
    for (i, ch) in source.char_indices() {
        if remaining == 0 {
            break;
        }
        if ch == '\n' {
            remaining -= 1;
            line_start = i + 1;
        }
    }
    let col = pos.column.saturating_sub(1) as usize;
    source[line_start..]
        .char_indices()
        .nth(col)
        .map(|(i, _)| line_start + i)
        .unwrap_or(source.len())
}

fn emit_report(
    kind_str: &str,
    color: Color,
    message: &str,
    pos: Option<Position>,
    source: &str,
    filename: Option<&str>,
) {
    let filename = filename.unwrap_or("<input>");

    let offset = pos.map(|p| byte_offset(source, p)).unwrap_or(0);
    let end = source.len().min(offset + 1);

    let report = Report::build(ReportKind::Error, filename, offset)
        .with_message(format!("{}: {}", kind_str.fg(color), message))
        .with_label(
            Label::new((filename, offset..end))
                .with_message(message)
                .with_color(color),
        )
        .finish();

    // Printing a diagnostic must not itself fail the pipeline.
    let _ = report.print((filename, Source::from(source)));
}
