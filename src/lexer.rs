use std::fmt;

use crate::cleaner::Cleaner;
use crate::config::Config;
use crate::error::{LexError, Position};
use crate::reader::SourceReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Func,
    Int,
    Float,
    Bool,
    Str,
    Folder,
    File,
    Audio,
    List,
    If,
    Else,
    While,
    Return,
    True,
    False,
    Void,
    Null,

    // Identifier and literals
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,

    // Operators
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    AndAnd,
    OrOr,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            TokenKind::Func => "'func'",
            TokenKind::Int => "'int'",
            TokenKind::Float => "'float'",
            TokenKind::Bool => "'bool'",
            TokenKind::Str => "'string'",
            TokenKind::Folder => "'Folder'",
            TokenKind::File => "'File'",
            TokenKind::Audio => "'Audio'",
            TokenKind::List => "'List'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::While => "'while'",
            TokenKind::Return => "'return'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Void => "'void'",
            TokenKind::Null => "'null'",
            TokenKind::Identifier => "identifier",
            TokenKind::IntLiteral => "integer literal",
            TokenKind::FloatLiteral => "float literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Assign => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Less => "'<'",
            TokenKind::LessEq => "'<='",
            TokenKind::Greater => "'>'",
            TokenKind::GreaterEq => "'>='",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::Dot => "'.'",
            TokenKind::Eof => "end of input",
        };
        write!(f, "{}", text)
    }
}

/// Literal payload of a token. Identifiers carry their text.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    None,
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, value: TokenValue, pos: Position) -> Self {
        Self { kind, value, pos }
    }

    pub fn simple(kind: TokenKind, pos: Position) -> Self {
        Self::new(kind, TokenValue::None, pos)
    }

    /// Text payload of identifiers and string literals.
    pub fn text(&self) -> &str {
        match &self.value {
            TokenValue::Str(s) => s,
            _ => "",
        }
    }
}

fn keyword_kind(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "func" => TokenKind::Func,
        "int" => TokenKind::Int,
        "float" => TokenKind::Float,
        "bool" => TokenKind::Bool,
        "string" => TokenKind::Str,
        "Folder" => TokenKind::Folder,
        "File" => TokenKind::File,
        "Audio" => TokenKind::Audio,
        "List" => TokenKind::List,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "return" => TokenKind::Return,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "void" => TokenKind::Void,
        "null" => TokenKind::Null,
        _ => return None,
    };
    Some(kind)
}

fn escape_char(ch: char) -> Option<char> {
    match ch {
        '"' => Some('"'),
        '\\' => Some('\\'),
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        _ => None,
    }
}

/// Streaming tokenizer over a `Cleaner`. Token start characters come
/// filtered through the cleaner; continuation characters are read raw so
/// whitespace and comments terminate multi-character tokens.
pub struct Lexer {
    cleaner: Cleaner,
    max_identifier_length: usize,
    max_string_length: usize,
    max_number_length: usize,
    // A raw continuation character that ended the previous token but has
    // not itself been turned into a token yet.
    pending: Option<(char, Position)>,
    finished: bool,
}

impl Lexer {
    pub fn new(source: &str, config: &Config) -> Self {
        let reader = SourceReader::new(source);
        Self {
            cleaner: Cleaner::new(reader, config),
            max_identifier_length: config.max_identifier_length,
            max_string_length: config.max_string_length,
            max_number_length: config.max_number_length,
            pending: None,
            finished: false,
        }
    }

    /// Lexes the whole source, including the final EOF token.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let start = match self.pending.take() {
            Some((ch, pos)) if !ch.is_whitespace() => {
                if ch == '/' && self.cleaner.peek_raw(1) == Some('*') {
                    // A comment directly abutting the previous token.
                    self.cleaner.next_raw();
                    self.cleaner.skip_comment_body()?;
                    self.cleaner.next_significant()?
                } else {
                    Some((ch, pos))
                }
            }
            _ => self.cleaner.next_significant()?,
        };

        let Some((ch, pos)) = start else {
            return Ok(Token::simple(TokenKind::Eof, self.cleaner.pos()));
        };

        if ch.is_alphabetic() || ch == '_' {
            return self.read_identifier(ch, pos);
        }
        if ch.is_ascii_digit() {
            return self.read_number(ch, pos);
        }
        if ch == '"' {
            return self.read_string(pos);
        }
        self.read_operator(ch, pos)
    }

    fn read_identifier(&mut self, first: char, pos: Position) -> Result<Token, LexError> {
        let mut text = String::new();
        let mut length = 0usize;
        let mut ch = first;
        loop {
            if length == self.max_identifier_length {
                return Err(LexError::IdentifierTooLong {
                    limit: self.max_identifier_length,
                    pos,
                });
            }
            text.push(ch);
            length += 1;
            match self.cleaner.peek_raw(1) {
                Some(next) if next.is_alphanumeric() || next == '_' => {
                    ch = match self.cleaner.next_raw() {
                        Some((c, _)) => c,
                        None => break,
                    };
                }
                _ => break,
            }
        }

        let token = match keyword_kind(&text) {
            Some(kind) => Token::simple(kind, pos),
            None => Token::new(TokenKind::Identifier, TokenValue::Str(text), pos),
        };
        Ok(token)
    }

    fn read_number(&mut self, first: char, pos: Position) -> Result<Token, LexError> {
        let mut value: i64 = 0;
        let mut is_float = false;
        let mut fractional_digits: u32 = 0;
        let mut length = 0usize;
        let mut ch = first;

        loop {
            if length == self.max_number_length {
                return Err(LexError::NumberTooLong {
                    limit: self.max_number_length,
                    pos,
                });
            }

            if let Some(digit) = ch.to_digit(10) {
                value = value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(digit as i64))
                    .ok_or_else(|| LexError::InvalidNumber {
                        text: format!("{}{}", value, digit),
                        pos,
                    })?;
                length += 1;
                if is_float {
                    fractional_digits += 1;
                }
            } else {
                // ch == '.': part of the literal only when a digit follows
                // and we are not already past a decimal point.
                debug_assert_eq!(ch, '.');
                let digit_follows = self
                    .cleaner
                    .peek_raw(1)
                    .is_some_and(|c| c.is_ascii_digit());
                if is_float || !digit_follows {
                    self.pending = Some((ch, self.cleaner.pos()));
                    return Ok(build_number(value, is_float, fractional_digits, pos));
                }
                is_float = true;
            }

            match self.cleaner.peek_raw(1) {
                Some(next) if next.is_ascii_digit() || next == '.' => {
                    ch = match self.cleaner.next_raw() {
                        Some((c, _)) => c,
                        None => break,
                    };
                }
                Some(_) => {
                    if let Some(raw) = self.cleaner.next_raw() {
                        self.pending = Some(raw);
                    }
                    break;
                }
                None => break,
            }
        }

        Ok(build_number(value, is_float, fractional_digits, pos))
    }

    fn read_string(&mut self, pos: Position) -> Result<Token, LexError> {
        let mut text = String::new();
        let mut length = 0usize;
        loop {
            let Some((mut ch, _)) = self.cleaner.next_raw() else {
                return Err(LexError::UnterminatedString { pos });
            };
            if ch == '"' {
                return Ok(Token::new(
                    TokenKind::StringLiteral,
                    TokenValue::Str(text),
                    pos,
                ));
            }
            if ch == '\\' {
                let Some((escaped, _)) = self.cleaner.next_raw() else {
                    return Err(LexError::UnterminatedString { pos });
                };
                ch = escape_char(escaped).ok_or(LexError::InvalidEscape {
                    found: escaped,
                    pos,
                })?;
            }
            if length == self.max_string_length {
                return Err(LexError::StringTooLong {
                    limit: self.max_string_length,
                    pos,
                });
            }
            text.push(ch);
            length += 1;
        }
    }

    fn read_operator(&mut self, ch: char, pos: Position) -> Result<Token, LexError> {
        let kind = match ch {
            '=' => self.one_or_two('=', TokenKind::Assign, TokenKind::EqEq),
            '<' => self.one_or_two('=', TokenKind::Less, TokenKind::LessEq),
            '>' => self.one_or_two('=', TokenKind::Greater, TokenKind::GreaterEq),
            '!' => self.pair_only('=', TokenKind::NotEq, ch, pos)?,
            '&' => self.pair_only('&', TokenKind::AndAnd, ch, pos)?,
            '|' => self.pair_only('|', TokenKind::OrOr, ch, pos)?,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            _ => return Err(LexError::InvalidCharacter { found: ch, pos }),
        };
        Ok(Token::simple(kind, pos))
    }

    fn one_or_two(&mut self, second: char, single: TokenKind, double: TokenKind) -> TokenKind {
        if self.cleaner.peek_raw(1) == Some(second) {
            self.cleaner.next_raw();
            double
        } else {
            single
        }
    }

    fn pair_only(
        &mut self,
        second: char,
        double: TokenKind,
        found: char,
        pos: Position,
    ) -> Result<TokenKind, LexError> {
        if self.cleaner.peek_raw(1) == Some(second) {
            self.cleaner.next_raw();
            Ok(double)
        } else {
            Err(LexError::InvalidCharacter { found, pos })
        }
    }
}

fn build_number(value: i64, is_float: bool, fractional_digits: u32, pos: Position) -> Token {
    if is_float {
        let divisor = 10f64.powi(fractional_digits as i32);
        Token::new(
            TokenKind::FloatLiteral,
            TokenValue::Float(value as f64 / divisor),
            pos,
        )
    } else {
        Token::new(TokenKind::IntLiteral, TokenValue::Int(value), pos)
    }
}

impl Iterator for Lexer {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_token() {
            Ok(token) => {
                if token.kind == TokenKind::Eof {
                    self.finished = true;
                }
                Some(Ok(token))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
